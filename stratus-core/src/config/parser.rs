//! Stack config file parser.
//!
//! Reads the INI-style stack config through `configparser` and turns each
//! section into a [`StackDescriptor`]. Sections keep their file order, and
//! values support `%(name)s` references to keys of the same section or DEFAULT.

use crate::error::{Result, StratusError};
use crate::types::StackDescriptor;
use configparser::ini::Ini;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Section whose values every other section inherits.
const DEFAULT_SECTION: &str = "DEFAULT";

/// Nesting limit for `%(name)s` references.
const MAX_INTERPOLATION_DEPTH: usize = 10;

/// One `[section]` of the raw file. Keys are lowercased; a key written
/// without a value maps to `None`.
#[derive(Debug, Default)]
struct RawSection {
    name: String,
    values: HashMap<String, Option<String>>,
}

/// Parser for INI stack config files.
pub struct StackConfigParser;

impl StackConfigParser {
    /// Parse a stack config from a string.
    ///
    /// Relative paths in the config are kept relative to the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The INI syntax is invalid
    /// - A `%(name)s` reference is malformed, unknown, or nested too deeply
    /// - A section lacks `template_path`
    pub fn parse(content: &str) -> Result<Vec<StackDescriptor>> {
        Self::parse_from(content, Path::new("<string>"), Path::new(""))
    }

    /// Parse a stack config file from disk.
    ///
    /// Relative template and parameter paths resolve against the directory
    /// that contains the config file.
    #[instrument]
    pub fn parse_file<P: AsRef<Path> + std::fmt::Debug>(path: P) -> Result<Vec<StackDescriptor>> {
        let path = path.as_ref();
        info!("Reading stack config from {:?}", path);

        let content = std::fs::read_to_string(path)
            .map_err(|e| StratusError::FileReadError { path: path.to_path_buf(), source: e })?;

        let base_dir = path.parent().unwrap_or(Path::new(""));
        Self::parse_from(&content, path, base_dir)
    }

    fn parse_from(content: &str, source: &Path, base_dir: &Path) -> Result<Vec<StackDescriptor>> {
        let (defaults, sections) = Self::read_sections(content, source)?;

        let mut descriptors = sections
            .iter()
            .map(|section| Self::to_descriptor(section, &defaults, base_dir))
            .collect::<Result<Vec<_>>>()?;

        Self::resolve_section_references(&mut descriptors);

        debug!(stacks = descriptors.len(), "Parsed stack config");
        Ok(descriptors)
    }

    /// Split the file into the DEFAULT section and the ordered stack sections.
    fn read_sections(content: &str, source: &Path) -> Result<(RawSection, Vec<RawSection>)> {
        // Section names keep their case; keys are folded below.
        let mut ini = Ini::new_cs();
        ini.set_default_section(DEFAULT_SECTION);
        ini.set_multiline(true);

        let map = ini.read(content.to_string()).map_err(|reason| StratusError::ConfigParse {
            path: source.to_path_buf(),
            reason,
        })?;

        let mut defaults = RawSection { name: DEFAULT_SECTION.to_string(), ..Default::default() };
        let mut sections = Vec::new();

        for (name, values) in map {
            let values =
                values.into_iter().map(|(key, value)| (key.to_lowercase(), value)).collect();
            if name == DEFAULT_SECTION {
                defaults.values = values;
            } else {
                sections.push(RawSection { name, values });
            }
        }

        Ok((defaults, sections))
    }

    fn to_descriptor(
        section: &RawSection,
        defaults: &RawSection,
        base_dir: &Path,
    ) -> Result<StackDescriptor> {
        let get = |field: &str| setting(section, defaults, field);
        let resolve = |p: String| -> PathBuf { base_dir.join(p) };

        let template_path = get("template_path")?.ok_or_else(|| StratusError::MissingField {
            section: section.name.clone(),
            field: "template_path",
        })?;

        Ok(StackDescriptor {
            name: get("name")?.unwrap_or_else(|| section.name.clone()),
            section: section.name.clone(),
            template_path: resolve(template_path),
            params_path: get("params_path")?.map(resolve),
            capabilities: split_list(get("capabilities")?.as_deref()),
            depends_on: split_list(get("depends_on")?.as_deref()),
            keys: split_list(get("keys")?.as_deref()),
        })
    }

    /// Dependencies may name a section instead of a stack; rewrite those to stack names.
    fn resolve_section_references(descriptors: &mut [StackDescriptor]) {
        let by_section: HashMap<String, String> =
            descriptors.iter().map(|d| (d.section.clone(), d.name.clone())).collect();
        let names: Vec<String> = descriptors.iter().map(|d| d.name.clone()).collect();

        for descriptor in descriptors.iter_mut() {
            for dep in descriptor.depends_on.iter_mut() {
                if names.contains(dep) {
                    continue;
                }
                if let Some(name) = by_section.get(dep.as_str()) {
                    *dep = name.clone();
                }
            }
        }
    }
}

/// Raw entry for `key` in `section`, falling back to DEFAULT.
fn raw_value<'a>(
    section: &'a RawSection,
    defaults: &'a RawSection,
    key: &str,
) -> Option<&'a Option<String>> {
    section.values.get(key).or_else(|| defaults.values.get(key))
}

/// Interpolated value of `field`. Empty and valueless keys count as unset,
/// and still override a DEFAULT value.
fn setting(section: &RawSection, defaults: &RawSection, field: &str) -> Result<Option<String>> {
    match raw_value(section, defaults, field) {
        Some(Some(raw)) => {
            let value = interpolate(section, defaults, field, raw, 1)?;
            Ok(Some(value).filter(|v| !v.is_empty()))
        }
        _ => Ok(None),
    }
}

/// Expand `%(name)s` references against the section and DEFAULT; `%%` is a literal `%`.
fn interpolate(
    section: &RawSection,
    defaults: &RawSection,
    option: &str,
    value: &str,
    depth: usize,
) -> Result<String> {
    let fail = |reason: String| StratusError::ConfigInterpolation {
        section: section.name.clone(),
        option: option.to_string(),
        reason,
    };

    if depth > MAX_INTERPOLATION_DEPTH {
        return Err(fail(format!(
            "references nested deeper than {} levels",
            MAX_INTERPOLATION_DEPTH
        )));
    }

    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if let Some(tail) = rest.strip_prefix("%%") {
            out.push('%');
            rest = tail;
            continue;
        }

        let reference = rest
            .strip_prefix("%(")
            .and_then(|r| r.find(")s").map(|end| (&r[..end], &r[end + 2..])))
            .filter(|(name, _)| !name.is_empty() && !name.contains(')'));
        let Some((name, tail)) = reference else {
            return Err(fail(format!("'%' must be followed by '%' or '(name)s', found: {}", rest)));
        };

        let key = name.to_lowercase();
        let referenced = match raw_value(section, defaults, &key) {
            Some(v) => v.as_deref().unwrap_or(""),
            None => {
                return Err(fail(format!("no option '{}' to substitute for %({})s", key, name)))
            }
        };

        if referenced.contains('%') {
            out.push_str(&interpolate(section, defaults, option, referenced, depth + 1)?);
        } else {
            out.push_str(referenced);
        }
        rest = tail;
    }

    out.push_str(rest);
    Ok(out)
}

/// Split a comma (or newline) separated list, dropping empty entries.
fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split([',', '\n'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
