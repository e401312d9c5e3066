//! End-to-end pipeline runs against scripted stand-ins for the external
//! collaborators (cutadapt passes reads through, bowtie2 emits a canned SAM),
//! so the whole chain from FASTQ to result tables is exercised without the
//! real binaries.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use mirvar_abundance::TableSelection;
use mirvar_library::LibraryStatus;
use mirvar_pipeline::{RunConfig, ToolPaths, run_pipeline};

const MATURES: &str = ">miR-x\nACGTGCGTAC\n>miR-z\nTTGTGCGTGG\n";
const HAIRPINS: &str = ">mir-x\nTTACGTGCGTACTT\n>mir-z\nGGTTGTGCGTGGAA\n";
const GFF: &str = "\
##gff-version 3
chr1\t.\tmiRNA_primary_transcript\t95\t125\t.\t+\t.\tID=MI0001;Name=mir-x
chr1\t.\tmiRNA\t101\t110\t.\t+\t.\tID=MIMAT0001;Name=miR-x;Derives_from=MI0001
chr2\t.\tmiRNA_primary_transcript\t195\t225\t.\t+\t.\tID=MI0002;Name=mir-z
chr2\t.\tmiRNA\t201\t210\t.\t+\t.\tID=MIMAT0002;Name=miR-z;Derives_from=MI0002
";
const VCF: &str = "\
##fileformat=VCFv4.2
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1
chr1\t105\trs1\tG\tA\t.\tPASS\t.\tGT\t0/1
";

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn fake_tools(dir: &Path, sam: &str) -> ToolPaths {
    let template = dir.join("mapped.sam.template");
    std::fs::write(&template, sam).unwrap();

    let cutadapt = write_script(
        dir,
        "fake-cutadapt",
        "#!/bin/sh\n\
         if [ \"$1\" = \"--version\" ]; then echo 1.0; exit 0; fi\n\
         out=\"\"; in=\"\"\n\
         while [ $# -gt 0 ]; do\n\
           case \"$1\" in\n\
             -a|-g|-m|-M|-q) shift 2 ;;\n\
             -o) out=\"$2\"; shift 2 ;;\n\
             *) in=\"$1\"; shift ;;\n\
           esac\n\
         done\n\
         cp \"$in\" \"$out\"\n",
    );

    let bowtie2 = write_script(
        dir,
        "fake-bowtie2",
        &format!(
            "#!/bin/sh\n\
             if [ \"$1\" = \"--version\" ]; then echo 1.0; exit 0; fi\n\
             out=\"\"; prev=\"\"\n\
             for a in \"$@\"; do\n\
               if [ \"$prev\" = \"-S\" ]; then out=\"$a\"; fi\n\
               prev=\"$a\"\n\
             done\n\
             cp {} \"$out\"\n",
            template.display()
        ),
    );

    let bowtie2_build = write_script(
        dir,
        "fake-bowtie2-build",
        "#!/bin/sh\nexit 0\n",
    );

    ToolPaths {
        cutadapt,
        bowtie2,
        bowtie2_build,
    }
}

fn fastq(reads: &[(&str, usize)]) -> String {
    let mut body = String::new();
    let mut n = 0;
    for (seq, copies) in reads {
        for _ in 0..*copies {
            n += 1;
            body.push_str(&format!("@read{}\n{}\n+\n{}\n", n, seq, "I".repeat(seq.len())));
        }
    }
    body
}

fn config_for(dir: &Path, with_vcf: bool, sam: &str, reads: &[(&str, usize)]) -> RunConfig {
    let write = |name: &str, content: &str| {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    };

    let reads_path = write("S1.fq", &fastq(reads));
    let mut config = RunConfig::new(reads_path, dir.join("out"));
    config.matures = write("matures.fa", MATURES);
    config.hairpins = write("hairpins.fa", HAIRPINS);
    config.coords = write("coords.gff3", GFF);
    config.vcf = with_vcf.then(|| write("genotypes.vcf", VCF));
    config.tables = TableSelection::all();
    config.tools = fake_tools(dir, sam);
    config
}

const SAM_WITH_ALLELES: &str = "\
@HD\tVN:1.6\tSO:unsorted
@SQ\tSN:miR-x\tLN:10
@SQ\tSN:miR-x@rs1:A\tLN:10
@SQ\tSN:miR-z\tLN:10
seq1_x10\t0\tmiR-x\t1\t42\t10M\t*\t0\t0\tACGTGCGTAC\tIIIIIIIIII
seq1_x10\t256\tmiR-x@rs1:A\t1\t42\t10M\t*\t0\t0\t*\t*
seq2_x5\t0\tmiR-x@rs1:A\t1\t42\t10M\t*\t0\t0\tACGTACGTAC\tIIIIIIIIII
seq2_x5\t256\tmiR-x\t1\t42\t10M\t*\t0\t0\t*\t*
seq3_x2\t0\tmiR-x\t1\t42\t10M\t*\t0\t0\tACGTTCGTAC\tIIIIIIIIII
";

#[test]
fn genotyped_run_classifies_and_flags() {
    let dir = tempfile::tempdir().unwrap();
    let reads = [("ACGTGCGTAC", 10), ("ACGTACGTAC", 5), ("ACGTTCGTAC", 2)];
    let mut config = config_for(dir.path(), true, SAM_WITH_ALLELES, &reads);
    config.write_vcf = true;

    let summary = run_pipeline(&config).unwrap();

    assert_eq!(summary.sample, "S1");
    assert_eq!(summary.library_status, LibraryStatus::Built);

    // every aligned read's count lands in exactly one bucket
    assert_eq!(summary.totals.consistent, 15);
    assert_eq!(summary.totals.inconsistent, 2);
    assert_eq!(summary.totals.ambiguous, 0);
    assert_eq!(summary.totals.not_applicable, 0);
    assert_eq!(summary.totals.total(), 17);

    // 2/17 inconsistent is far above the 1% default threshold
    assert_eq!(summary.suspicious_sites, 1);

    let abundances =
        std::fs::read_to_string(summary.results_dir.join("S1_abundances.tsv")).unwrap();
    assert!(abundances.contains("miR-x\tS1\t17"));

    let polymirs = std::fs::read_to_string(summary.results_dir.join("S1_polymiRs.tsv")).unwrap();
    assert!(polymirs.contains("miR-x\trs1\tG\t0/1\t10\t0\t0"));
    assert!(polymirs.contains("miR-x\trs1\tA\t0/1\t5\t0\t0"));

    let consistency =
        std::fs::read_to_string(summary.results_dir.join("S1_consistency.tsv")).unwrap();
    assert!(consistency.contains("highly_suspicious"));

    let vcf = std::fs::read_to_string(summary.results_dir.join("S1_consistency.vcf")).unwrap();
    assert!(vcf.contains("SUSP"));
}

#[test]
fn second_run_reuses_the_cached_library() {
    let dir = tempfile::tempdir().unwrap();
    let reads = [("ACGTGCGTAC", 10), ("ACGTACGTAC", 5), ("ACGTTCGTAC", 2)];
    let config = config_for(dir.path(), true, SAM_WITH_ALLELES, &reads);

    let first = run_pipeline(&config).unwrap();
    assert_eq!(first.library_status, LibraryStatus::Built);

    let second = run_pipeline(&config).unwrap();
    assert_eq!(second.library_status, LibraryStatus::Reused);
    assert_eq!(second.totals, first.totals);
}

const SAM_CANONICAL_ONLY: &str = "\
@HD\tVN:1.6\tSO:unsorted
@SQ\tSN:miR-x\tLN:10
@SQ\tSN:miR-z\tLN:10
seq1_x10\t0\tmiR-x\t1\t42\t10M\t*\t0\t0\tACGTGCGTAC\tIIIIIIIIII
seq2_x5\t0\tmiR-x\t1\t42\t10M\t*\t0\t0\tACGTACGTAC\tIIIIIIIIII
seq3_x2\t0\tmiR-z\t1\t42\t10M\t*\t0\t0\tTTGTGCGTGG\tIIIIIIIIII
";

#[test]
fn run_without_genotypes_degrades_to_not_applicable() {
    let dir = tempfile::tempdir().unwrap();
    let reads = [("ACGTGCGTAC", 10), ("ACGTACGTAC", 5), ("TTGTGCGTGG", 2)];
    let summary =
        run_pipeline(&config_for(dir.path(), false, SAM_CANONICAL_ONLY, &reads)).unwrap();

    assert_eq!(summary.totals.not_applicable, 17);
    assert_eq!(summary.totals.consistent, 0);
    assert_eq!(summary.suspicious_sites, 0);

    // variant-level outputs are empty, expression tables still there
    let polymirs = std::fs::read_to_string(summary.results_dir.join("S1_polymiRs.tsv")).unwrap();
    assert_eq!(polymirs.lines().count(), 1); // header only

    let abundances =
        std::fs::read_to_string(summary.results_dir.join("S1_abundances.tsv")).unwrap();
    assert!(abundances.contains("miR-x\tS1\t15"));
    assert!(abundances.contains("miR-z\tS1\t2"));

    let isomirs =
        std::fs::read_to_string(summary.results_dir.join("S1_isomiRs_dist.tsv")).unwrap();
    assert!(isomirs.contains("miR-x\tref\t10"));
    assert!(isomirs.contains("miR-x\tsub:5G>A\t5"));
}
