use std::path::PathBuf;

use anyhow::Result;
use clap::ArgMatches;

use mirvar_library::{IndexBuilder, LibraryInputs, LibraryStatus, prepare_library};

pub fn prepare(matches: &ArgMatches) -> Result<()> {
    let path_arg = |name: &str| PathBuf::from(matches.get_one::<String>(name).unwrap());

    let inputs = LibraryInputs {
        matures: path_arg("matures"),
        hairpins: path_arg("hairpins"),
        coords: path_arg("gff3"),
        vcf: matches.get_one::<String>("vcf").map(PathBuf::from),
    };
    let out = path_arg("out");
    let builder = IndexBuilder::new(path_arg("bowtie2-build"));

    builder.verify()?;
    let (library, status) = prepare_library(&inputs, &out, &builder)?;
    for warning in &library.warnings {
        eprintln!("WARNING: {}", warning);
    }

    println!(
        "Library {} at {}: {} sequences, {} variant sites, genotypes {}",
        match status {
            LibraryStatus::Built => "built",
            LibraryStatus::Reused => "reused",
        },
        out.display(),
        library.references.len(),
        library.sites.len(),
        if library.genotypes_available {
            format!("for {} samples", library.samples.len())
        } else {
            "unavailable".to_string()
        }
    );

    Ok(())
}
