use clap::{Arg, Command};

pub const LIBRARY_CMD: &str = "library";

pub fn create_library_cli() -> Command {
    Command::new(LIBRARY_CMD)
        .about("Build (or refresh) the allele-expanded alignment library without processing any sample.")
        .arg(Arg::new("matures").long("matures").required(true).help("Mature miRNA FASTA"))
        .arg(Arg::new("hairpins").long("hairpins").required(true).help("Hairpin FASTA"))
        .arg(
            Arg::new("gff3")
                .long("gff3")
                .required(true)
                .help("miRNA coordinate annotation (GFF3)"),
        )
        .arg(Arg::new("vcf").long("vcf").help("Genotype VCF with the variants to incorporate"))
        .arg(
            Arg::new("out")
                .long("out")
                .short('o')
                .default_value("./mirvar_lib")
                .help("Library directory"),
        )
        .arg(
            Arg::new("bowtie2-build")
                .long("bowtie2-build")
                .default_value("bowtie2-build")
                .help("Path to the bowtie2 index builder binary"),
        )
}
