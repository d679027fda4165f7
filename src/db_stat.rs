
use itertools::Itertools;

use crate::data_types::database::DefinitionDatabase;

/// Prints the statistics for a given database
/// # Arguments
/// * `database` - the database to print the statistics for
pub fn print_stats(database: &DefinitionDatabase) {
    // display the database metadata
    let db_metadata = database.database_metadata();
    println!("Database metadata:");
    println!("\tVersion: {}", db_metadata.version());
    println!("\tSource: {}", db_metadata.source());
    println!("\tBuild time: {}", db_metadata.build_time());

    // display the database gene statistics
    let gene_entries = database.gene_entries();
    println!("Database gene statistics:");
    println!("\tTotal genes: {}", gene_entries.len());
    println!("\tTotal alleles: {}", gene_entries.values().map(|g| g.named_alleles().len()).sum::<usize>());
    println!("\tTotal positions: {}", gene_entries.values().map(|g| g.positions().len()).sum::<usize>());
    println!("\tGenes with exemptions: {}", database.exemptions().len());

    println!("Gene capabilities:");
    for (gene, capabilities) in database.gene_config().capabilities().iter() {
        println!("\t{gene}: {}", capabilities.iter().join(", "));
    }

    // now do per-gene statistics, but these are just if we have elevated verbosity
    if log::log_enabled!(log::Level::Debug) {
        println!();
        println!("Gene entry statistics:");
        println!("gene\tchromosome\talleles\tpositions\thas_reference\tignored_alleles\textra_positions");
        for (gene, gene_entry) in gene_entries.iter() {
            let has_reference = gene_entry.reference_allele().is_some();
            let (ignored_alleles, extra_positions) = database.exemptions().get(gene)
                .map(|e| (e.ignored_alleles().len(), e.extra_positions().len()))
                .unwrap_or((0, 0));
            println!(
                "{gene}\t{}\t{}\t{}\t{has_reference}\t{ignored_alleles}\t{extra_positions}",
                gene_entry.chromosome(), gene_entry.named_alleles().len(), gene_entry.positions().len()
            );
        }
        println!();
    }
}
