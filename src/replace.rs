use log::debug;
use std::fs;
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;

/// Name prefix of the conversion output created inside the input directory
pub const TEMP_FILE_PREFIX: &str = ".tmp_out";

/// Scoped owner of the temporary conversion output.
///
/// The file gets a fresh unique name, so nothing that existed before the run is
/// touched. It is removed when the guard is dropped unless [`TempOutput::persist`]
/// moved it into place first.
#[derive(Debug)]
pub struct TempOutput {
    file: NamedTempFile,
}

impl TempOutput {
    /// Creates an empty `.tmp_out*.wav` file inside `dir`
    pub fn new_in(dir: impl AsRef<Path>) -> io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .suffix(".wav")
            .tempfile_in(dir)?;
        debug!("Created temporary file {:?}", file.path());
        Ok(TempOutput { file })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Moves the temporary output over `dest`, keeping the permissions `dest` had.
    ///
    /// On error the temporary file is removed and `dest` is left as it was, unless
    /// the cross-device copy failed midway.
    pub fn persist(self, dest: impl AsRef<Path>) -> io::Result<()> {
        let dest = dest.as_ref();
        if let Ok(meta) = fs::metadata(dest) {
            fs::set_permissions(self.path(), meta.permissions())?;
        }
        match self.file.persist(dest) {
            Ok(_) => Ok(()),
            Err(e) if e.error.kind() == io::ErrorKind::CrossesDevices => {
                fs::copy(e.file.path(), dest)?;
                Ok(())
            }
            Err(e) => Err(e.error),
        }
    }
}
