//! Multipart layout resolution
//!
//! A multipart entity tag is not a digest over the whole byte stream, so the
//! checker must first recover how the object was split into parts. Stored
//! metadata only records the total size and (sometimes) a part count; the
//! part boundaries themselves are reconstructed here.

use tagsweep_errors::DigestError;
use tagsweep_types::ObjectDescriptor;

const MIB: u64 = 1024 * 1024;

/// Default part size used by the major SDK uploaders.
const DEFAULT_PART_SIZE: u64 = 8 * MIB;

/// How the comparable digest for an object must be computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestSpec {
    /// The stored tag is a single MD5 over the full byte stream.
    WholeObject,
    /// The stored tag is the composite multipart digest; parts are hashed
    /// independently at these sizes, in order.
    MultipartComposite { part_sizes: Vec<u64> },
}

impl DigestSpec {
    /// Part count for this spec (1 for whole-object digests).
    #[must_use]
    pub fn part_count(&self) -> usize {
        match self {
            Self::WholeObject => 1,
            Self::MultipartComposite { part_sizes } => part_sizes.len(),
        }
    }
}

/// Determine the digest shape for one object.
///
/// The part count comes from object metadata when the backend exposes it,
/// falling back to the `-<n>` suffix multipart uploads leave on the tag.
/// When both are present they must agree.
///
/// # Errors
///
/// Returns [`DigestError::UnknownLayout`] when the metadata is inconsistent
/// (part count disagrees with the tag suffix, or no uniform part size can
/// reproduce the declared size/part-count pair). Layout failures are logic
/// mismatches, not transient conditions; callers degrade the object's
/// verdict rather than retrying.
pub fn resolve_layout(descriptor: &ObjectDescriptor) -> Result<DigestSpec, DigestError> {
    let tag_parts = descriptor.stored_tag.part_suffix();

    let parts = match (descriptor.part_count, tag_parts) {
        (Some(meta), Some(tag)) if meta != tag => {
            return Err(DigestError::UnknownLayout {
                reason: format!(
                    "metadata declares {meta} parts but the stored tag says {tag}"
                ),
            });
        }
        (Some(meta), _) => meta,
        (None, Some(tag)) => tag,
        (None, None) => 1,
    };

    if parts <= 1 && tag_parts.is_none() {
        return Ok(DigestSpec::WholeObject);
    }

    // A `-1` tag is still a composite digest over a single part.
    if parts == 1 {
        return Ok(DigestSpec::MultipartComposite {
            part_sizes: vec![descriptor.size_bytes],
        });
    }

    let part_sizes = infer_part_sizes(descriptor.size_bytes, u64::from(parts))?;
    Ok(DigestSpec::MultipartComposite { part_sizes })
}

/// Reconstruct uniform part sizes: every part `p` bytes except a possibly
/// shorter final part.
///
/// `p` reproduces the layout iff `p * (parts - 1) < size <= p * parts`.
/// Preference order: the SDK default (8 MiB) when it qualifies, then the
/// smallest qualifying whole-MiB size, then the exact `ceil(size/parts)`
/// (covers sub-MiB objects uploaded with tiny parts). Uploads with
/// non-uniform hand-picked part sizes cannot be reconstructed and fail.
fn infer_part_sizes(size: u64, parts: u64) -> Result<Vec<u64>, DigestError> {
    debug_assert!(parts >= 2);

    if size < parts {
        return Err(DigestError::UnknownLayout {
            reason: format!("{size} bytes cannot form {parts} non-empty parts"),
        });
    }

    let qualifies = |p: u64| p > 0 && p * (parts - 1) < size && size <= p * parts;

    let part_size = if qualifies(DEFAULT_PART_SIZE) {
        DEFAULT_PART_SIZE
    } else {
        // Smallest qualifying whole-MiB size: p >= ceil(size/parts), so start
        // the scan at that boundary and stop once p*(parts-1) reaches size.
        let p_min = size.div_ceil(parts);
        let mut candidate = None;
        let mut k = p_min.div_ceil(MIB);
        loop {
            let p = k * MIB;
            if p * (parts - 1) >= size {
                break;
            }
            if qualifies(p) {
                candidate = Some(p);
                break;
            }
            k += 1;
        }

        match candidate {
            Some(p) => p,
            None if qualifies(p_min) => p_min,
            None => {
                return Err(DigestError::UnknownLayout {
                    reason: format!(
                        "no uniform part size reproduces {size} bytes in {parts} parts"
                    ),
                });
            }
        }
    };

    let mut sizes = Vec::with_capacity(usize::try_from(parts).unwrap_or(0));
    let mut remaining = size;
    for _ in 0..parts {
        let this = remaining.min(part_size);
        sizes.push(this);
        remaining -= this;
    }
    debug_assert_eq!(remaining, 0);

    Ok(sizes)
}
