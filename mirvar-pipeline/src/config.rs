use std::path::PathBuf;

use mirvar_abundance::{AmbiguousPolicy, TableSelection};
use mirvar_resolve::ScoringParams;

use crate::tools::ToolPaths;

///
/// Everything one sample run needs, resolved once up front and passed
/// explicitly into each stage. No stage mutates it.
///
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub reads: PathBuf,
    pub vcf: Option<PathBuf>,
    pub matures: PathBuf,
    pub hairpins: PathBuf,
    pub coords: PathBuf,
    pub out_dir: PathBuf,

    /// Seed length handed to the aligner (`-L`).
    pub seed_len: u32,
    pub scoring: ScoringParams,
    pub inconsistency_threshold: f64,

    /// 3' adapter candidates, tried in order by the trimmer.
    pub adapters_3p: Vec<String>,
    pub adapter_5p: String,
    pub read_min: u32,
    pub read_max: u32,
    pub quality_threshold: u32,

    pub tables: TableSelection,
    pub ambiguous_policy: AmbiguousPolicy,
    pub write_vcf: bool,
    /// Re-trim even when a previous run's trimmed file is still fresh.
    pub trim_again: bool,
    pub keep_temp: bool,

    pub tools: ToolPaths,
}

impl RunConfig {
    /// NEB + Illumina small RNA 3' adapters, NEB 5' adapter, matching the
    /// defaults the pipeline was tuned for.
    pub fn new(reads: PathBuf, out_dir: PathBuf) -> RunConfig {
        RunConfig {
            reads,
            vcf: None,
            matures: PathBuf::from("resources/fasta/hsa_matures_miRBase_v21.fa"),
            hairpins: PathBuf::from("resources/fasta/hsa_hairpins_miRBase_v21.fa"),
            coords: PathBuf::from("resources/coordinates/hsa_miRBase_v21.gff3"),
            out_dir,
            seed_len: 17,
            scoring: ScoringParams::default(),
            inconsistency_threshold: 0.01,
            adapters_3p: vec![
                "AGATCGGAAGAGCACACGTCTGAACTCCAGTCAC".to_string(),
                "TGGAATTCTCGGGTGCCAAGG".to_string(),
            ],
            adapter_5p: "ATCTACACGTTCAGAGTTCTACAGTCCGACGATC".to_string(),
            read_min: 15,
            read_max: 27,
            quality_threshold: 28,
            tables: TableSelection::all(),
            ambiguous_policy: AmbiguousPolicy::Report,
            write_vcf: false,
            trim_again: false,
            keep_temp: true,
            tools: ToolPaths::default(),
        }
    }

    pub fn library_dir(&self) -> PathBuf {
        self.out_dir.join("mirvar_lib")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.out_dir.join("mirvar_tmp")
    }

    pub fn results_dir(&self) -> PathBuf {
        self.out_dir.join("mirvar_results")
    }

    pub fn trimming_dir(&self) -> PathBuf {
        self.tmp_dir().join("0_trimming")
    }

    pub fn collapsing_dir(&self) -> PathBuf {
        self.tmp_dir().join("1_collapsing")
    }

    pub fn mapping_dir(&self) -> PathBuf {
        self.tmp_dir().join("2_mapping")
    }
}
