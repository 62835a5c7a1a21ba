pub mod allele;
