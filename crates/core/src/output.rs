//! Destinations for generated text.

use std::{
    convert::Infallible,
    fmt,
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use tempfile::NamedTempFile;

use crate::err::Result;

/// Where a generator's output goes. `-` on the command line means stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Stdout,
    File(PathBuf),
}

impl FromStr for Target {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "-" => Target::Stdout,
            path => Target::File(PathBuf::from(path)),
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Stdout => f.write_str("<stdout>"),
            Target::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Target {
    /// Run `fill` against a buffered writer for this target. Files only appear
    /// at their destination once `fill` has succeeded.
    pub fn write_with<F>(&self, fill: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        match self {
            Target::Stdout => {
                let mut writer = BufWriter::new(io::stdout().lock());
                fill(&mut writer)?;
                writer.flush()?;
                Ok(())
            }
            Target::File(path) => write_atomically(path, fill),
        }
    }
}

/// Write into a temporary file next to `path` and rename it over `path` once
/// complete. On error the temporary file is removed and `path` is untouched.
pub fn write_atomically<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        fill(&mut writer)?;
        writer.flush()?;
    }
    publishable(staged.as_file())?;
    staged.persist(path)?;
    tracing::debug!(path = %path.display(), "persisted output");
    Ok(())
}

/// Temporary files are created owner-only; the finished file should carry
/// ordinary permissions.
#[cfg(unix)]
fn publishable(file: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn publishable(_file: &File) -> io::Result<()> {
    Ok(())
}
