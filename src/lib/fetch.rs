//! Download an artifact archive and extract it into a destination directory.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::error::Error;
use crate::github::{Artifact, GithubClient};

/// Size of the chunks the response body is copied to disk in. The whole
/// archive is never buffered in memory during the download.
pub const CHUNK_SIZE: usize = 1024;

/// Download `artifact` and unpack its zip archive into `dest`.
///
/// A [`None`] artifact is a no-op: nothing is created on disk and no request
/// is made. The destination directory is created if missing; a pre-existing
/// directory is not an error. The archive is spooled to an unnamed temporary
/// file, rewound, and extracted in full, so archives larger than memory are
/// fine on the download side.
pub fn download_and_unpack(
    client: &GithubClient,
    artifact: Option<&Artifact>,
    dest: &Path,
) -> Result<(), Error> {
    let Some(artifact) = artifact else {
        return Ok(());
    };
    fs::create_dir_all(dest)?;
    let response = client.download(artifact)?;
    let mut archive = spool(response)?;
    archive.seek(SeekFrom::Start(0))?;
    unpack(archive, dest)?;
    println!("Extracted artifact {} into {}", artifact.name, dest.display());
    Ok(())
}

/// Copy a byte stream into an unnamed temporary file in fixed-size chunks.
fn spool<R: Read>(mut source: R) -> io::Result<File> {
    let mut file = tempfile::tempfile()?;
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let n = source.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        file.write_all(&chunk[..n])?;
    }
    Ok(file)
}

/// Extract a zip archive into `dest`. Extraction needs a seekable reader,
/// which is why downloads are spooled to a file first.
pub fn unpack<R: Read + Seek>(archive: R, dest: &Path) -> Result<(), Error> {
    let mut archive = zip::ZipArchive::new(archive)?;
    debug!("extracting {} entries into {}", archive.len(), dest.display());
    archive.extract(dest)?;
    Ok(())
}

#[cfg(test)]
mod test_fetch {
    use std::io::Cursor;

    use zip::write::SimpleFileOptions;

    use super::*;
    use crate::auth::Credentials;

    fn dummy_client() -> GithubClient {
        GithubClient::new(Credentials {
            username: "user".to_string(),
            token: "token".to_string(),
        })
        .unwrap()
    }

    fn zip_with(entries: &[(&str, &[u8])]) -> Cursor<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap()
    }

    #[test]
    fn absent_artifact_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("never-created");
        download_and_unpack(&dummy_client(), None, &dest).unwrap();
        assert!(!dest.exists());
    }

    #[test]
    fn spool_copies_more_than_one_chunk() {
        let payload: Vec<u8> = (0..CHUNK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        let mut file = spool(Cursor::new(payload.clone())).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        let mut copied = Vec::new();
        file.read_to_end(&mut copied).unwrap();
        assert_eq!(copied, payload);
    }

    #[test]
    fn unpack_restores_nested_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = zip_with(&[
            ("linux-64/katana-0.1.tar.bz2", b"not really bzip2".as_slice()),
            ("readme.txt", b"hello".as_slice()),
        ]);
        archive.seek(SeekFrom::Start(0)).unwrap();
        unpack(archive, dir.path()).unwrap();
        let package = dir.path().join("linux-64/katana-0.1.tar.bz2");
        assert_eq!(fs::read(&package).unwrap(), b"not really bzip2");
        assert_eq!(fs::read_to_string(dir.path().join("readme.txt")).unwrap(), "hello");
    }

    #[test]
    fn unpack_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let result = unpack(Cursor::new(b"this is not a zip".to_vec()), dir.path());
        assert!(matches!(result, Err(Error::Zip(_))));
    }
}
