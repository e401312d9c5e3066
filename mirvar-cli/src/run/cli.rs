use clap::{Arg, ArgAction, Command, value_parser};

pub const RUN_CMD: &str = "run";

pub fn create_run_cli() -> Command {
    Command::new(RUN_CMD)
        .about("Run the full pipeline for one sample: library build, trimming, collapsing, alignment, resolution and abundance tables.")
        .arg(
            Arg::new("reads")
                .required(true)
                .help("Sample reads in FASTQ (optionally gzipped); the file stem is the sample name"),
        )
        .arg(
            Arg::new("out")
                .long("out")
                .short('o')
                .default_value("./mirvar")
                .help("Output directory"),
        )
        .arg(
            Arg::new("vcf")
                .long("vcf")
                .short('g')
                .help("Genotype VCF; without it all genotype classification degrades to not-applicable"),
        )
        .arg(Arg::new("matures").long("matures").help("Mature miRNA FASTA"))
        .arg(Arg::new("hairpins").long("hairpins").help("Hairpin FASTA"))
        .arg(Arg::new("gff3").long("gff3").help("miRNA coordinate annotation (GFF3)"))
        .arg(
            Arg::new("seed-len")
                .long("seed-len")
                .value_parser(value_parser!(u32))
                .default_value("17")
                .help("Alignment seed length (bowtie2 -L)"),
        )
        .arg(
            Arg::new("weight5")
                .long("weight5")
                .value_parser(value_parser!(u32))
                .default_value("4")
                .help("Weight applied to mismatches in the 5'-proximal window"),
        )
        .arg(
            Arg::new("window5")
                .long("window5")
                .value_parser(value_parser!(usize))
                .default_value("2")
                .help("Size of the 5'-proximal window, in bases"),
        )
        .arg(
            Arg::new("score-threshold")
                .long("score-threshold")
                .value_parser(value_parser!(u32))
                .default_value("9")
                .help("Alignments scoring strictly above this are discarded"),
        )
        .arg(
            Arg::new("inconsistent-rate")
                .long("inconsistent-rate")
                .value_parser(value_parser!(f64))
                .default_value("0.01")
                .help("Per-site inconsistency rate above which a site is flagged highly suspicious"),
        )
        .arg(
            Arg::new("adapt3")
                .long("adapt3")
                .action(ArgAction::Append)
                .help("3' adapter sequence (repeatable; defaults: NEB and Illumina small RNA adapters)"),
        )
        .arg(Arg::new("adapt5").long("adapt5").help("5' adapter sequence"))
        .arg(
            Arg::new("read-min")
                .long("read-min")
                .value_parser(value_parser!(u32))
                .default_value("15")
                .help("Minimum read length kept after trimming"),
        )
        .arg(
            Arg::new("read-max")
                .long("read-max")
                .value_parser(value_parser!(u32))
                .default_value("27")
                .help("Maximum read length kept after trimming"),
        )
        .arg(
            Arg::new("quality")
                .long("quality")
                .value_parser(value_parser!(u32))
                .default_value("28")
                .help("Base-quality trimming threshold"),
        )
        .arg(
            Arg::new("annot")
                .long("annot")
                .default_value("hpics")
                .help("Reports to produce: h hairpins, p polymiRs, i consistency, c ambiguous reads, s isomiR distribution"),
        )
        .arg(
            Arg::new("vcf-out")
                .long("vcf-out")
                .action(ArgAction::SetTrue)
                .help("Also export per-site genotype consistency as VCF"),
        )
        .arg(
            Arg::new("split-ambiguous")
                .long("split-ambiguous")
                .action(ArgAction::SetTrue)
                .help("Divide ambiguous read counts evenly across tied loci in the hairpin/mature tables (never silent; off by default)"),
        )
        .arg(
            Arg::new("trim-again")
                .long("trim-again")
                .action(ArgAction::SetTrue)
                .help("Re-trim even when a previous run's trimmed reads are still fresh"),
        )
        .arg(
            Arg::new("rm-temp")
                .long("rm-temp")
                .action(ArgAction::SetTrue)
                .help("Remove temporary files (trimmed, collapsed, mapped) after a successful run"),
        )
        .arg(Arg::new("cutadapt").long("cutadapt").help("Path to the cutadapt binary"))
        .arg(Arg::new("bowtie2").long("bowtie2").help("Path to the bowtie2 binary"))
        .arg(
            Arg::new("bowtie2-build")
                .long("bowtie2-build")
                .help("Path to the bowtie2 index builder binary"),
        )
}
