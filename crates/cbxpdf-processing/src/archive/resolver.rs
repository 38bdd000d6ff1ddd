use std::collections::HashMap;
use std::path::Path;

use cbxpdf_core::{AppError, AppResult, ArchiveKind};

use super::{attempt_order, reader_for};

fn basename(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Find the stored entry name that `wanted` refers to.
///
/// Candidates are tried in order: the exact name, the name with `\`
/// turned into `/`, the name with `/` turned into `\`, and finally any
/// entry whose basename matches the wanted basename (exact case first).
pub fn resolve_name<'a, S: AsRef<str>>(entries: &'a [S], wanted: &str) -> Option<&'a str> {
    let names: Vec<&'a str> = entries.iter().map(|e| e.as_ref()).collect();

    let variants = [
        wanted.to_string(),
        wanted.replace('\\', "/"),
        wanted.replace('/', "\\"),
    ];
    for variant in &variants {
        if let Some(found) = names.iter().find(|n| **n == variant.as_str()) {
            return Some(*found);
        }
    }

    let wanted_base = basename(wanted);
    if wanted_base.is_empty() {
        return None;
    }
    names
        .iter()
        .find(|n| basename(n) == wanted_base)
        .or_else(|| {
            names
                .iter()
                .find(|n| basename(n).eq_ignore_ascii_case(wanted_base))
        })
        .copied()
}

/// Outcome of reading `wanted` names as one archive kind: `(position in
/// wanted, bytes or per-entry error)` for every name the kind could resolve.
type KindReads = Vec<(usize, AppResult<Vec<u8>>)>;

fn extract_as(
    path: &Path,
    kind: ArchiveKind,
    wanted: &[&str],
    pending: &[usize],
) -> AppResult<KindReads> {
    let Some(reader) = reader_for(kind) else {
        return Ok(Vec::new());
    };
    let names: Vec<String> = reader
        .list_entries(path)?
        .into_iter()
        .filter(|e| !e.is_dir)
        .map(|e| e.name)
        .collect();

    let resolved: Vec<(usize, &str)> = pending
        .iter()
        .filter_map(|&i| resolve_name(&names, wanted[i]).map(|stored| (i, stored)))
        .collect();
    if resolved.is_empty() {
        return Ok(Vec::new());
    }

    let mut stored: Vec<&str> = resolved.iter().map(|(_, name)| *name).collect();
    stored.sort_unstable();
    stored.dedup();
    let mut reads = reader.read_entries(path, &stored)?;

    // Several wanted names may share one stored entry; only the last takes it
    let mut uses: HashMap<&str, usize> = HashMap::new();
    for (_, name) in &resolved {
        *uses.entry(*name).or_default() += 1;
    }

    let mut out = Vec::with_capacity(resolved.len());
    for (i, name) in resolved {
        let remaining = uses.entry(name).or_default();
        *remaining -= 1;
        let outcome = if *remaining == 0 {
            reads.remove(name)
        } else {
            reads.get(name).map(|read| match read {
                Ok(data) => Ok(data.clone()),
                Err(e) => Err(entry_error(wanted[i], e)),
            })
        };
        if let Some(outcome) = outcome {
            out.push((i, outcome));
        }
    }
    Ok(out)
}

/// Per-entry copy of `e`, keeping the variants callers act on.
fn entry_error(entry_name: &str, e: &AppError) -> AppError {
    match e {
        AppError::EncryptedArchive(m) => AppError::EncryptedArchive(m.clone()),
        AppError::ExtractionFailed(m) => AppError::ExtractionFailed(m.clone()),
        other => AppError::ExtractionFailed(format!(
            "Could not extract '{}': {}",
            entry_name, other
        )),
    }
}

fn encrypted(path: &Path) -> AppError {
    AppError::EncryptedArchive(
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
    )
}

/// Extract several entries of the archive at `path` in one go.
///
/// Results line up with `wanted`, duplicates included. The archive is read
/// as `kind` first and as the other family second, each time listing it
/// once and resolving every name with [`resolve_name`]. Encrypted archives
/// are refused without any extraction attempt.
pub fn extract_entries(
    path: &Path,
    kind: ArchiveKind,
    wanted: &[&str],
) -> Vec<AppResult<Vec<u8>>> {
    if kind == ArchiveKind::RarEncrypted {
        return wanted.iter().map(|_| Err(encrypted(path))).collect();
    }

    let mut found: Vec<Option<Vec<u8>>> = wanted.iter().map(|_| None).collect();
    let mut failures: Vec<Option<AppError>> = wanted.iter().map(|_| None).collect();

    for attempt in attempt_order(kind) {
        let pending: Vec<usize> = (0..wanted.len()).filter(|&i| found[i].is_none()).collect();
        if pending.is_empty() {
            break;
        }

        // A readable container that lacks an entry outranks a library
        // error from the wrong container kind.
        let primary = attempt == kind;
        match extract_as(path, attempt, wanted, &pending) {
            Ok(reads) => {
                for (i, outcome) in reads {
                    match outcome {
                        Ok(data) if !data.is_empty() => found[i] = Some(data),
                        Ok(_) => {}
                        Err(e) => {
                            tracing::debug!(
                                entry = %wanted[i],
                                kind = %attempt,
                                error = %e,
                                "Entry extraction failed"
                            );
                            if primary {
                                failures[i] = Some(e);
                            }
                        }
                    }
                }
            }
            Err(e) => {
                tracing::debug!(kind = %attempt, error = %e, "Extraction attempt failed");
                if primary {
                    for &i in &pending {
                        failures[i] = Some(entry_error(wanted[i], &e));
                    }
                }
            }
        }
    }

    wanted
        .iter()
        .zip(found.into_iter().zip(failures))
        .map(|(name, (data, failure))| match (data, failure) {
            (Some(data), _) => Ok(data),
            (None, Some(e)) => Err(entry_error(name, &e)),
            (None, None) => Err(AppError::EntryNotFound(format!(
                "Entry '{}' not found in archive",
                name
            ))),
        })
        .collect()
}

/// Extract the bytes of `entry_name` from the archive at `path`.
///
/// See [`extract_entries`] for the lookup order.
pub fn extract_entry(path: &Path, kind: ArchiveKind, entry_name: &str) -> AppResult<Vec<u8>> {
    extract_entries(path, kind, &[entry_name])
        .pop()
        .unwrap_or_else(|| {
            Err(AppError::EntryNotFound(format!(
                "Entry '{}' not found in archive",
                entry_name
            )))
        })
}
