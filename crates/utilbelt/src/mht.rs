use crate::prelude::{eprintln, println, *};
use std::path::{Path, PathBuf};
use utilbelt_core::mht;

#[derive(Debug, clap::Parser)]
#[command(name = "mht")]
#[command(about = "Inline an MHT recording's screenshots as data URLs")]
pub struct App {
    /// Path to the .mht file to fix
    pub file: PathBuf,

    /// Where to write the fixed document (defaults to `<name>-edit.<ext>`
    /// next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let contents = std::fs::read_to_string(&app.file)
        .map_err(|e| eyre!("Failed to read {}: {}", app.file.display(), e))?;

    let fixed = mht::fix_mht(&contents).map_err(|e| eyre!(e))?;

    if fixed.base64_images.is_empty() {
        log::warn!("No images found in the provided mht file");
    } else {
        log::info!(
            "Found {} images in the provided mht file",
            fixed.base64_images.len()
        );
    }

    if global.verbose {
        for (index, image) in fixed.base64_images.iter().enumerate() {
            eprintln!("image {index}: {} base64 characters", image.clean.len());
        }
    }

    let output_path = app.output.unwrap_or_else(|| edit_filename(&app.file));
    std::fs::write(&output_path, fixed.result)
        .map_err(|e| eyre!("Failed to write {}: {}", output_path.display(), e))?;

    println!("Results have been written to {}", output_path.display());

    Ok(())
}

/// `<dir>/<stem>-edit.<ext>` next to the input. Any file already there is
/// overwritten.
fn edit_filename(file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("output");

    match file.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => file.with_file_name(f!("{stem}-edit.{ext}")),
        None => file.with_file_name(f!("{stem}-edit")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_filename_keeps_directory_and_extension() {
        assert_eq!(
            edit_filename(Path::new("/tmp/Recording_20250813_2227.mht")),
            PathBuf::from("/tmp/Recording_20250813_2227-edit.mht")
        );
    }

    #[test]
    fn edit_filename_without_extension() {
        assert_eq!(
            edit_filename(Path::new("recording")),
            PathBuf::from("recording-edit")
        );
    }
}
