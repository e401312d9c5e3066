use std::path::PathBuf;

use anyhow::Result;
use clap::ArgMatches;

use mirvar_abundance::{AmbiguousPolicy, TableSelection};
use mirvar_pipeline::{RunConfig, run_pipeline};
use mirvar_resolve::ScoringParams;

pub fn run_sample(matches: &ArgMatches) -> Result<()> {
    let reads = matches
        .get_one::<String>("reads")
        .expect("A path to the sample reads is required.");
    let out = matches.get_one::<String>("out").expect("out has a default");

    let mut config = RunConfig::new(PathBuf::from(reads), PathBuf::from(out));

    if let Some(vcf) = matches.get_one::<String>("vcf") {
        config.vcf = Some(PathBuf::from(vcf));
    }
    if let Some(matures) = matches.get_one::<String>("matures") {
        config.matures = PathBuf::from(matures);
    }
    if let Some(hairpins) = matches.get_one::<String>("hairpins") {
        config.hairpins = PathBuf::from(hairpins);
    }
    if let Some(gff3) = matches.get_one::<String>("gff3") {
        config.coords = PathBuf::from(gff3);
    }

    config.seed_len = *matches.get_one::<u32>("seed-len").unwrap();
    config.scoring = ScoringParams {
        five_prime_window: *matches.get_one::<usize>("window5").unwrap(),
        five_prime_weight: *matches.get_one::<u32>("weight5").unwrap(),
        score_threshold: *matches.get_one::<u32>("score-threshold").unwrap(),
    };
    config.inconsistency_threshold = *matches.get_one::<f64>("inconsistent-rate").unwrap();

    let adapters: Vec<String> = matches
        .get_many::<String>("adapt3")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    if !adapters.is_empty() {
        config.adapters_3p = adapters;
    }
    if let Some(adapter) = matches.get_one::<String>("adapt5") {
        config.adapter_5p = adapter.clone();
    }
    config.read_min = *matches.get_one::<u32>("read-min").unwrap();
    config.read_max = *matches.get_one::<u32>("read-max").unwrap();
    config.quality_threshold = *matches.get_one::<u32>("quality").unwrap();

    config.tables = TableSelection::parse(matches.get_one::<String>("annot").unwrap())?;
    config.write_vcf = matches.get_flag("vcf-out");
    if matches.get_flag("split-ambiguous") {
        config.ambiguous_policy = AmbiguousPolicy::SplitEqually;
    }
    config.trim_again = matches.get_flag("trim-again");
    config.keep_temp = !matches.get_flag("rm-temp");

    if let Some(cutadapt) = matches.get_one::<String>("cutadapt") {
        config.tools.cutadapt = PathBuf::from(cutadapt);
    }
    if let Some(bowtie2) = matches.get_one::<String>("bowtie2") {
        config.tools.bowtie2 = PathBuf::from(bowtie2);
    }
    if let Some(builder) = matches.get_one::<String>("bowtie2-build") {
        config.tools.bowtie2_build = PathBuf::from(builder);
    }

    run_pipeline(&config)?;
    Ok(())
}
