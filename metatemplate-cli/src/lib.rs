use anyhow::{Context, Result, bail};
use metatemplate_compiler::{
    CompileOptions, ComponentOptions, FileMap, FormatId, Template, make_index, make_templates,
    preview_template,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "metatemplate.toml";
pub const DEFAULT_OUT_DIR: &str = "target/metatemplate";

/// `metatemplate.toml`
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Format ids; empty means all of them.
    pub formats: Vec<String>,
    pub out_dir: Option<PathBuf>,
    pub react: Option<ComponentOptions>,
}

impl Config {
    /// Reads `path`, or `metatemplate.toml` in the working directory when it
    /// exists. An explicit path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(CONFIG_FILE);
                if !default.exists() {
                    log::debug!("no {CONFIG_FILE}, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };
        let text =
            fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let config =
            toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))?;
        log::debug!("loaded {}", path.display());
        Ok(config)
    }
}

/// Config merged with command-line overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub formats: Vec<FormatId>,
    pub out_dir: PathBuf,
    pub compile: CompileOptions,
}

impl Settings {
    /// Non-empty `formats` and a `Some` `out_dir` win over the config.
    pub fn resolve(config: &Config, formats: &[String], out_dir: Option<&Path>) -> Result<Self> {
        let names = if formats.is_empty() { &config.formats } else { formats };
        Ok(Self {
            formats: parse_formats(names)?,
            out_dir: out_dir
                .map(Path::to_path_buf)
                .or_else(|| config.out_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR)),
            compile: CompileOptions { react: config.react },
        })
    }
}

pub fn parse_formats(names: &[String]) -> Result<Vec<FormatId>> {
    if names.is_empty() {
        return Ok(FormatId::ALL.to_vec());
    }
    let mut formats = Vec::with_capacity(names.len());
    for name in names {
        let id: FormatId = name.parse()?;
        if !formats.contains(&id) {
            formats.push(id);
        }
    }
    Ok(formats)
}

/// `<name>.html` files, with `<name>.css` beside them when present. A
/// directory contributes every `.html` file directly inside it.
pub fn read_templates(inputs: &[PathBuf]) -> Result<Vec<Template>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(input)
                .with_context(|| format!("failed to list {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.extension().is_some_and(|ext| ext == "html"))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }

    files
        .into_iter()
        .map(|path| {
            let id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .with_context(|| format!("no template name in {}", path.display()))?
                .to_string();
            let html =
                fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let css_path = path.with_extension("css");
            let css = if css_path.exists() {
                fs::read_to_string(&css_path)
                    .with_context(|| format!("failed to read {}", css_path.display()))?
            } else {
                String::new()
            };
            Ok(Template::new(id, html, css))
        })
        .collect()
}

pub fn write_files(out_dir: &Path, files: &FileMap) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(files.len());
    for (relative, content) in files {
        let path = out_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))?;
        log::debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Compiles every template into every format and refreshes the index files.
///
/// A template that fails to compile writes nothing; the others still build
/// and the command fails at the end.
pub fn build_cmd(inputs: &[PathBuf], settings: &Settings) -> Result<Vec<PathBuf>> {
    let templates = read_templates(inputs)?;
    let mut written = Vec::new();
    let mut failed = 0usize;

    for template in &templates {
        match make_templates(template, &settings.formats, &settings.compile) {
            Ok(outputs) => {
                for output in outputs {
                    written.extend(write_files(&settings.out_dir, &output.files)?);
                }
                log::info!("built {}", template.id);
            }
            Err(e) => {
                log::error!("{e}");
                failed += 1;
            }
        }
    }

    written.extend(index_cmd(&settings.out_dir, &settings.formats, &settings.compile)?);
    if failed > 0 {
        bail!("{failed} of {} template(s) failed to compile", templates.len());
    }
    Ok(written)
}

/// Writes index files for each component format from what is already in
/// `out_dir`.
pub fn index_cmd(out_dir: &Path, formats: &[FormatId], options: &CompileOptions) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for &format in formats {
        let dir = out_dir.join(format.dirname());
        if format.component_options().is_none() || !dir.is_dir() {
            continue;
        }
        let mut paths: Vec<String> = fs::read_dir(&dir)
            .with_context(|| format!("failed to list {}", dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| is_component_file(format, name, options))
            .map(|name| format!("{}/{name}", format.dirname()))
            .collect();
        paths.sort();

        let files = make_index(format, &paths, options)?;
        written.extend(write_files(out_dir, &files)?);
    }
    Ok(written)
}

fn is_component_file(format: FormatId, name: &str, options: &CompileOptions) -> bool {
    let Some(defaults) = format.component_options() else {
        return false;
    };
    let extension = options.react.unwrap_or(defaults).language.extension();
    Path::new(name).extension().is_some_and(|ext| ext == extension)
        && !matches!(
            Path::new(name).file_stem().and_then(|s| s.to_str()),
            Some("index" | "indexNotLazy")
        )
}

/// `key=value`
pub fn parse_assignment(s: &str) -> Result<(String, String)> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => bail!("expected key=value, got {s:?}"),
    }
}

/// Renders one template as plain HTML. `values_file` holds a JSON object of
/// strings; `assignments` override it.
pub fn preview_cmd(
    input: &Path,
    values_file: Option<&Path>,
    assignments: &[(String, String)],
) -> Result<String> {
    let mut values: BTreeMap<String, String> = match values_file {
        Some(path) => {
            let text =
                fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => BTreeMap::new(),
    };
    values.extend(assignments.iter().cloned());

    let template = read_templates(&[input.to_path_buf()])?
        .pop()
        .with_context(|| format!("no template in {}", input.display()))?;
    Ok(preview_template(&template, &values)?)
}
