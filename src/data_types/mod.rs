
/// Contains definitions related to our underlying catalog of genes -> positions -> named alleles
pub mod database;
/// Contains the per-gene overrides that ship with the catalog
pub mod exemption;
/// Contains the gene capability table and the run-level matcher options
pub mod gene_config;
/// Contains the IUPAC ambiguity code table
pub mod iupac;
/// Contains definitions related to the representation of the final gene calls
pub mod match_results;
/// Contains the raw catalog entries and their matcher-ready projections
pub mod named_allele;
/// Contains the sample calls that get matched
pub mod sample_allele;
/// Contains the variant position definitions
pub mod variant_locus;
