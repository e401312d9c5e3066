use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use mirvar_core::MirvarError;

use crate::config::RunConfig;

/// Paths to the external collaborator binaries, `$PATH` lookups by default.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub cutadapt: PathBuf,
    pub bowtie2: PathBuf,
    pub bowtie2_build: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> ToolPaths {
        ToolPaths {
            cutadapt: PathBuf::from("cutadapt"),
            bowtie2: PathBuf::from("bowtie2"),
            bowtie2_build: PathBuf::from("bowtie2-build"),
        }
    }
}

fn tool_error(program: &Path, detail: String) -> MirvarError {
    MirvarError::ExternalTool {
        program: program.display().to_string(),
        detail,
    }
}

fn probe(program: &Path) -> Result<(), MirvarError> {
    let output = Command::new(program)
        .arg("--version")
        .output()
        .map_err(|e| tool_error(program, format!("cannot invoke: {}", e)))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(tool_error(
            program,
            format!("--version probe failed: {}", output.status),
        ))
    }
}

impl ToolPaths {
    /// Probe every collaborator before the first stage runs, so a missing
    /// binary aborts the run immediately instead of mid-pipeline.
    pub fn verify(&self) -> Result<(), MirvarError> {
        probe(&self.cutadapt)?;
        probe(&self.bowtie2)?;
        probe(&self.bowtie2_build)?;
        Ok(())
    }
}

fn run_checked(program: &Path, args: &[OsString]) -> Result<(), MirvarError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| tool_error(program, format!("cannot invoke: {}", e)))?;
    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(tool_error(
            program,
            format!("{} ({})", output.status, stderr.lines().last().unwrap_or("no stderr")),
        ))
    }
}

/// cutadapt invocation: both adapter ends, length bounds and a base-quality
/// cutoff, reads in / trimmed reads out.
pub fn cutadapt_args(config: &RunConfig, input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    for adapter in &config.adapters_3p {
        args.push("-a".into());
        args.push(adapter.as_str().into());
    }
    args.push("-g".into());
    args.push(config.adapter_5p.as_str().into());
    args.push("-m".into());
    args.push(config.read_min.to_string().into());
    args.push("-M".into());
    args.push(config.read_max.to_string().into());
    args.push("-q".into());
    args.push(config.quality_threshold.to_string().into());
    args.push("-o".into());
    args.push(output.as_os_str().to_os_string());
    args.push(input.as_os_str().to_os_string());
    args
}

pub fn run_cutadapt(config: &RunConfig, input: &Path, output: &Path) -> Result<(), MirvarError> {
    run_checked(&config.tools.cutadapt, &cutadapt_args(config, input, output))
}

/// Aligner invocation: local mode on the expanded library, forward strand
/// only, all alignments reported so multi-mapping reads keep every
/// candidate, collapsed FASTA in, SAM out.
pub fn bowtie2_args(
    config: &RunConfig,
    index_prefix: &Path,
    input: &Path,
    output: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--local".into(),
        "--norc".into(),
        "--no-unal".into(),
        "-a".into(),
        "-f".into(),
        "-L".into(),
        config.seed_len.to_string().into(),
    ];
    args.push("-x".into());
    args.push(index_prefix.as_os_str().to_os_string());
    args.push("-U".into());
    args.push(input.as_os_str().to_os_string());
    args.push("-S".into());
    args.push(output.as_os_str().to_os_string());
    args
}

pub fn run_bowtie2(
    config: &RunConfig,
    index_prefix: &Path,
    input: &Path,
    output: &Path,
) -> Result<(), MirvarError> {
    run_checked(
        &config.tools.bowtie2,
        &bowtie2_args(config, index_prefix, input, output),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> RunConfig {
        RunConfig::new(PathBuf::from("S1.fq"), PathBuf::from("out"))
    }

    #[test]
    fn missing_binary_fails_the_probe() {
        let tools = ToolPaths {
            cutadapt: PathBuf::from("/no/such/cutadapt"),
            ..ToolPaths::default()
        };
        let err = tools.verify().unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("cutadapt"));
    }

    #[test]
    fn cutadapt_gets_both_adapters_and_bounds() {
        let args = cutadapt_args(&config(), Path::new("in.fq"), Path::new("out.fq"));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().to_string()).collect();
        assert_eq!(args.iter().filter(|a| *a == "-a").count(), 2);
        let m = args.iter().position(|a| a == "-m").unwrap();
        assert_eq!(args[m + 1], "15");
        let q = args.iter().position(|a| a == "-q").unwrap();
        assert_eq!(args[q + 1], "28");
        assert_eq!(args.last().unwrap(), "in.fq");
    }

    #[test]
    fn aligner_runs_local_forward_only_with_all_alignments() {
        let args = bowtie2_args(
            &config(),
            Path::new("lib/index/library"),
            Path::new("collapsed.fa"),
            Path::new("mapped.sam"),
        );
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().to_string()).collect();
        for flag in ["--local", "--norc", "--no-unal", "-a", "-f"] {
            assert!(args.contains(&flag.to_string()), "missing {}", flag);
        }
        let seed = args.iter().position(|a| a == "-L").unwrap();
        assert_eq!(args[seed + 1], "17");
    }
}
