//! Reader for Text-Fabric feature directories.
//!
//! A `.tf` file starts with `@`-prefixed metadata lines and a blank line.
//! Each data line is either `value` (applies to the node after the previous
//! one), `n\tvalue` or `a-b\tvalue`; node specs may be comma-separated.

use crate::{LexemeRecord, ProviderError, TargetLexicon};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const OTYPE_FILE: &str = "otype.tf";
/// Upper bound on the nodes of one type; the full BHSA has about 1.5 million nodes.
pub const MAX_NODES: u64 = 10_000_000;
const DEFAULT_NODE_TYPE: &str = "lex";

/// A run of consecutive nodes sharing one feature value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub first: u64,
    pub last: u64,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct TextFabricProvider {
    dir: PathBuf,
    features: Vec<String>,
    node_type: String,
}

impl TextFabricProvider {
    pub fn new(dir: impl Into<PathBuf>, features: &[&str]) -> Self {
        Self {
            dir: dir.into(),
            features: features.iter().map(|f| f.to_string()).collect(),
            node_type: DEFAULT_NODE_TYPE.to_string(),
        }
    }

    pub fn with_node_type(mut self, node_type: &str) -> Self {
        self.node_type = node_type.to_string();
        self
    }

    async fn read(&self, file: &Path) -> Result<String, ProviderError> {
        tokio::fs::read_to_string(file)
            .await
            .map_err(|source| ProviderError::Io {
                path: file.display().to_string(),
                source,
            })
    }
}

#[async_trait::async_trait]
impl TargetLexicon for TextFabricProvider {
    fn name(&self) -> &str {
        "text-fabric"
    }

    async fn load(&self) -> Result<Vec<LexemeRecord>, ProviderError> {
        if !self.dir.is_dir() {
            return Err(ProviderError::Unavailable(format!(
                "Text-Fabric directory not found: {}",
                self.dir.display()
            )));
        }
        let otype_path = self.dir.join(OTYPE_FILE);
        if !otype_path.exists() {
            return Err(ProviderError::Unavailable(format!(
                "{} missing in {}",
                OTYPE_FILE,
                self.dir.display()
            )));
        }

        let otype = parse_feature(&self.read(&otype_path).await?)?;
        let mut nodes: BTreeMap<u64, BTreeMap<String, String>> =
            nodes_of_type(&otype, &self.node_type)?
                .into_iter()
                .map(|n| (n, BTreeMap::new()))
                .collect();
        info!("Found {} {} nodes", nodes.len(), self.node_type);

        for feature in &self.features {
            let path = self.dir.join(format!("{feature}.tf"));
            if !path.exists() {
                warn!("Feature file {} not found; values left empty", path.display());
                continue;
            }
            let segments = parse_feature(&self.read(&path).await?)?;
            let mut assigned = 0usize;
            for seg in segments {
                for (_, values) in nodes.range_mut(seg.first..=seg.last) {
                    values.insert(feature.clone(), seg.value.clone());
                    assigned += 1;
                }
            }
            debug!("Feature {feature}: {assigned} values on {} nodes", self.node_type);
        }

        Ok(nodes
            .into_iter()
            .map(|(node, features)| LexemeRecord { node, features })
            .collect())
    }
}

/// Decodes the data section of a `.tf` file into node segments.
pub fn parse_feature(content: &str) -> Result<Vec<Segment>, ProviderError> {
    let mut lines = content.lines().enumerate().peekable();
    while let Some((_, line)) = lines.peek() {
        if line.starts_with('@') {
            lines.next();
        } else {
            break;
        }
    }
    if let Some((_, line)) = lines.peek() {
        if line.trim().is_empty() {
            lines.next();
        }
    }

    let mut segments = Vec::new();
    // None once the previous node was u64::MAX.
    let mut next = Some(1u64);
    for (line_no, raw) in lines {
        let line = raw.trim_end_matches('\r');
        let implicit = |next: Option<u64>| {
            next.ok_or_else(|| {
                ProviderError::Parse(format!("line {}: node number overflow", line_no + 1))
            })
        };
        match line.split_once('\t') {
            Some((spec, value)) if !spec.is_empty() => {
                let ranges = parse_node_spec(spec).map_err(|e| {
                    ProviderError::Parse(format!("line {}: {}", line_no + 1, e))
                })?;
                let value = unescape(value);
                for &(first, last) in &ranges {
                    segments.push(Segment {
                        first,
                        last,
                        value: value.clone(),
                    });
                }
                if let Some(&(_, last)) = ranges.last() {
                    next = last.checked_add(1);
                }
            }
            Some((_, value)) => {
                let node = implicit(next)?;
                segments.push(Segment {
                    first: node,
                    last: node,
                    value: unescape(value),
                });
                next = node.checked_add(1);
            }
            None => {
                if !line.is_empty() {
                    let node = implicit(next)?;
                    segments.push(Segment {
                        first: node,
                        last: node,
                        value: unescape(line),
                    });
                }
                next = next.and_then(|n| n.checked_add(1));
            }
        }
    }
    Ok(segments)
}

/// Expands the node ranges in `otype` segments whose value equals `node_type`.
///
/// Fails when the ranges would expand to more than [`MAX_NODES`] nodes.
pub fn nodes_of_type(segments: &[Segment], node_type: &str) -> Result<Vec<u64>, ProviderError> {
    let matching: Vec<&Segment> = segments.iter().filter(|s| s.value == node_type).collect();
    let total = matching
        .iter()
        .try_fold(0u64, |acc, s| acc.checked_add((s.last - s.first).checked_add(1)?));
    match total {
        Some(n) if n <= MAX_NODES => {}
        _ => {
            return Err(ProviderError::Parse(format!(
                "{node_type} ranges exceed {MAX_NODES} nodes"
            )))
        }
    }
    Ok(matching.iter().flat_map(|s| s.first..=s.last).collect())
}

fn parse_node_spec(spec: &str) -> Result<Vec<(u64, u64)>, String> {
    spec.split(',')
        .map(|part| {
            let part = part.trim();
            match part.split_once('-') {
                Some((a, b)) => {
                    let first = parse_node(a)?;
                    let last = parse_node(b)?;
                    if first > last {
                        return Err(format!("descending node range {part:?}"));
                    }
                    Ok((first, last))
                }
                None => parse_node(part).map(|n| (n, n)),
            }
        })
        .collect()
}

fn parse_node(s: &str) -> Result<u64, String> {
    s.trim()
        .parse::<u64>()
        .map_err(|_| format!("invalid node number {s:?}"))
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
