use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};

use mirvar_abundance::{ClassificationTotals, aggregate, write_consistency_vcf, write_tables};
use mirvar_core::utils::{check_input_exists, sample_name_from_path};
use mirvar_library::{IndexBuilder, LibraryInputs, LibraryPaths, LibraryStatus, prepare_library};
use mirvar_resolve::{read_alignments, resolve_reads, site_reports};

use crate::collapse::{collapse_reads, load_collapsed};
use crate::config::RunConfig;
use crate::stage::Stage;
use crate::tools::{run_bowtie2, run_cutadapt};

/// What a completed sample run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub sample: String,
    pub library_status: LibraryStatus,
    pub results_dir: PathBuf,
    pub written: Vec<PathBuf>,
    pub totals: ClassificationTotals,
    pub suspicious_sites: usize,
}

///
/// Run the full stage chain for one sample:
/// library build → trim → collapse → align → post-process.
///
/// Stages are strictly sequential; each one needs the previous stage's
/// complete output. Fresh stage outputs are reused (the trim stage
/// additionally honors `trim_again`), and the library build is skipped
/// entirely when the content digest of its inputs is unchanged.
///
pub fn run_pipeline(config: &RunConfig) -> Result<RunSummary> {
    let started = Instant::now();

    check_input_exists(&config.reads)?;
    config.tools.verify()?;

    let sample = sample_name_from_path(&config.reads);
    println!("Processing sample {}", sample);

    // library build (content-hash cached)
    let step = Instant::now();
    let builder = IndexBuilder::new(&config.tools.bowtie2_build);
    let inputs = LibraryInputs {
        matures: config.matures.clone(),
        hairpins: config.hairpins.clone(),
        coords: config.coords.clone(),
        vcf: config.vcf.clone(),
    };
    let (library, library_status) = prepare_library(&inputs, &config.library_dir(), &builder)?;
    for warning in &library.warnings {
        eprintln!("WARNING: {}", warning);
    }
    println!(
        "Library {} ({} sequences, {} variant sites) [{:.1}s]",
        match library_status {
            LibraryStatus::Built => "built",
            LibraryStatus::Reused => "reused",
        },
        library.references.len(),
        library.sites.len(),
        step.elapsed().as_secs_f64()
    );

    let genotyped = library.genotypes_available && library.samples.iter().any(|s| *s == sample);
    if library.genotypes_available && !genotyped {
        eprintln!(
            "WARNING: sample {} does not match any genotyped sample in the variant file",
            sample
        );
    }
    let sample_ref = genotyped.then_some(sample.as_str());

    // trim
    let step = Instant::now();
    let trimmed = config.trimming_dir().join(format!("{}.trimmed.fq", sample));
    let trim_stage = Stage::new("trim", vec![config.reads.clone()], vec![trimmed.clone()]);
    let ran = trim_stage.run(config.trim_again, || {
        run_cutadapt(config, &config.reads, &trimmed)?;
        Ok(())
    })?;
    println!(
        "{} [{:.1}s]",
        if ran { "Adapters trimmed" } else { "Reusing trimmed reads" },
        step.elapsed().as_secs_f64()
    );

    // collapse
    let step = Instant::now();
    let collapsed = config.collapsing_dir().join(format!("{}.collapsed.fa", sample));
    let collapse_stage = Stage::new("collapse", vec![trimmed.clone()], vec![collapsed.clone()]);
    let table = if collapse_stage.is_fresh() {
        load_collapsed(&collapsed)?
    } else {
        std::fs::create_dir_all(config.collapsing_dir())?;
        collapse_reads(&trimmed, &collapsed)?
    };
    println!(
        "{} reads collapsed into {} unique sequences [{:.1}s]",
        table.total_reads,
        table.reads.len(),
        step.elapsed().as_secs_f64()
    );

    // align
    let step = Instant::now();
    let mapped = config.mapping_dir().join(format!("{}.sam", sample));
    let library_paths = LibraryPaths::new(config.library_dir());
    let align_stage = Stage::new(
        "align",
        vec![collapsed.clone(), library_paths.manifest()],
        vec![mapped.clone()],
    );
    let ran = align_stage.run(false, || {
        run_bowtie2(config, &library_paths.index_prefix(), &collapsed, &mapped)?;
        Ok(())
    })?;
    println!(
        "{} [{:.1}s]",
        if ran { "Reads aligned" } else { "Reusing alignments" },
        step.elapsed().as_secs_f64()
    );

    // post-process
    let step = Instant::now();
    let groups = read_alignments(&mapped, &library, &table.reads)?;
    let resolved = resolve_reads(groups, &library, &config.scoring, sample_ref);
    let reports = site_reports(&resolved, &library, sample_ref, config.inconsistency_threshold);
    let tables = aggregate(&resolved, &library, sample_ref, config.ambiguous_policy);

    for report in reports.iter().filter(|r| r.suspicious) {
        eprintln!(
            "WARNING: site {} looks highly suspicious (inconsistency rate {:.4} over {} reads)",
            report.site_id,
            report.rate,
            report.classified()
        );
    }

    let results_dir = config.results_dir();
    let mut written = write_tables(
        &results_dir,
        &sample,
        &tables,
        &reports,
        &library,
        &config.tables,
    )?;
    if config.write_vcf {
        if genotyped {
            let path = results_dir.join(format!("{}_consistency.vcf", sample));
            write_consistency_vcf(&path, &sample, &library, &reports)?;
            written.push(path);
        } else {
            eprintln!("WARNING: no genotypes for this sample, skipping VCF output");
        }
    }
    println!(
        "Classified {} aligned reads [{:.1}s]",
        tables.totals.total(),
        step.elapsed().as_secs_f64()
    );

    if !config.keep_temp {
        std::fs::remove_dir_all(config.tmp_dir())
            .with_context(|| format!("Failed to remove {:?}", config.tmp_dir()))?;
    }

    println!(
        "Results in {} [{:.1}s total]",
        results_dir.display(),
        started.elapsed().as_secs_f64()
    );

    Ok(RunSummary {
        sample,
        library_status,
        results_dir,
        written,
        totals: tables.totals,
        suspicious_sites: reports.iter().filter(|r| r.suspicious).count(),
    })
}
