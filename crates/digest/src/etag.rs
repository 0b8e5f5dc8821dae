//! Streaming entity-tag computation

use crate::layout::DigestSpec;
use digest::Digest;
use md5::Md5;
use tagsweep_errors::DigestError;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Size of chunks for streaming digest computation
pub const CHUNK_SIZE: usize = 64 * 1024; // 64KB

/// Hex-encoded MD5 of a byte slice.
#[must_use]
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Compute the digest an S3-compatible backend would have recorded for this
/// content, in the stored tag's textual format.
///
/// The stream is consumed exactly once and fully, in [`CHUNK_SIZE`] chunks;
/// whole objects are never buffered. For [`DigestSpec::WholeObject`] the
/// result is the plain hex MD5. For [`DigestSpec::MultipartComposite`] each
/// declared part is hashed independently, the raw 16-byte part digests are
/// concatenated in part order, and the result is
/// `<hex MD5 of concatenation>-<part_count>`.
///
/// # Errors
///
/// Returns [`DigestError::ReadFailed`] if the stream errors partway, and
/// [`DigestError::LengthMismatch`] if it ends at a different length than
/// the layout declares.
pub async fn compute_digest<R>(
    mut reader: R,
    spec: &DigestSpec,
    declared_size: u64,
) -> Result<String, DigestError>
where
    R: AsyncRead + Unpin + Send,
{
    match spec {
        DigestSpec::WholeObject => {
            let mut hasher = Md5::new();
            let mut buffer = vec![0u8; CHUNK_SIZE];
            let mut total = 0u64;

            loop {
                let n = reader
                    .read(&mut buffer)
                    .await
                    .map_err(|e| DigestError::ReadFailed {
                        message: e.to_string(),
                    })?;
                if n == 0 {
                    break;
                }
                hasher.update(&buffer[..n]);
                total += n as u64;
            }

            if total != declared_size {
                return Err(DigestError::LengthMismatch {
                    expected: declared_size,
                    actual: total,
                });
            }

            Ok(hex::encode(hasher.finalize()))
        }
        DigestSpec::MultipartComposite { part_sizes } => {
            let mut concatenated = Vec::with_capacity(part_sizes.len() * 16);
            let mut buffer = vec![0u8; CHUNK_SIZE];
            let mut total = 0u64;

            for &part_size in part_sizes {
                let mut part_hasher = Md5::new();
                let mut remaining = part_size;

                while remaining > 0 {
                    let want = usize::try_from(remaining.min(CHUNK_SIZE as u64))
                        .unwrap_or(CHUNK_SIZE);
                    let n = reader.read(&mut buffer[..want]).await.map_err(|e| {
                        DigestError::ReadFailed {
                            message: e.to_string(),
                        }
                    })?;
                    if n == 0 {
                        // Stream ended inside a declared part
                        return Err(DigestError::LengthMismatch {
                            expected: declared_size,
                            actual: total,
                        });
                    }
                    part_hasher.update(&buffer[..n]);
                    remaining -= n as u64;
                    total += n as u64;
                }

                concatenated.extend_from_slice(&part_hasher.finalize());
            }

            // The stream must be exhausted once every part is consumed
            loop {
                let n = reader
                    .read(&mut buffer)
                    .await
                    .map_err(|e| DigestError::ReadFailed {
                        message: e.to_string(),
                    })?;
                if n == 0 {
                    break;
                }
                total += n as u64;
            }
            if total != declared_size || total != part_sizes.iter().sum::<u64>() {
                return Err(DigestError::LengthMismatch {
                    expected: declared_size,
                    actual: total,
                });
            }

            Ok(format!(
                "{}-{}",
                hex::encode(Md5::digest(&concatenated)),
                part_sizes.len()
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_whole_object_known_vector() {
        let digest = compute_digest(Cursor::new(b"hello"), &DigestSpec::WholeObject, 5)
            .await
            .unwrap();
        assert_eq!(digest, "5d41402abc4b2a76b9719d911017c592");
    }

    #[tokio::test]
    async fn test_empty_object() {
        let digest = compute_digest(Cursor::new(b""), &DigestSpec::WholeObject, 0)
            .await
            .unwrap();
        assert_eq!(digest, "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[tokio::test]
    async fn test_whole_object_length_mismatch() {
        let err = compute_digest(Cursor::new(b"hello"), &DigestSpec::WholeObject, 6)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DigestError::LengthMismatch {
                expected: 6,
                actual: 5
            }
        ));
    }

    #[tokio::test]
    async fn test_composite_matches_manual_computation() {
        let content = b"helloworld";
        let spec = DigestSpec::MultipartComposite {
            part_sizes: vec![5, 5],
        };

        let mut concat = Vec::new();
        concat.extend_from_slice(&md5::Md5::digest(b"hello"));
        concat.extend_from_slice(&md5::Md5::digest(b"world"));
        let expected = format!("{}-2", hex::encode(md5::Md5::digest(&concat)));

        let digest = compute_digest(Cursor::new(content), &spec, 10)
            .await
            .unwrap();
        assert_eq!(digest, expected);
        assert!(digest.ends_with("-2"));
    }

    #[tokio::test]
    async fn test_composite_is_deterministic() {
        let spec = DigestSpec::MultipartComposite {
            part_sizes: vec![3, 3, 2],
        };
        let first = compute_digest(Cursor::new(b"abcdefgh"), &spec, 8)
            .await
            .unwrap();
        let second = compute_digest(Cursor::new(b"abcdefgh"), &spec, 8)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_composite_differs_from_whole_object() {
        let spec = DigestSpec::MultipartComposite {
            part_sizes: vec![5, 5],
        };
        let composite = compute_digest(Cursor::new(b"helloworld"), &spec, 10)
            .await
            .unwrap();
        let whole = compute_digest(Cursor::new(b"helloworld"), &DigestSpec::WholeObject, 10)
            .await
            .unwrap();
        assert_ne!(composite.trim_end_matches("-2"), whole);
    }

    #[tokio::test]
    async fn test_composite_short_stream() {
        let spec = DigestSpec::MultipartComposite {
            part_sizes: vec![5, 5],
        };
        let err = compute_digest(Cursor::new(b"hello"), &spec, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, DigestError::LengthMismatch { .. }));
    }

    #[tokio::test]
    async fn test_composite_trailing_bytes() {
        let spec = DigestSpec::MultipartComposite {
            part_sizes: vec![5, 5],
        };
        let err = compute_digest(Cursor::new(b"helloworldX"), &spec, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, DigestError::LengthMismatch { .. }));
    }
}
