//! JSON filter presets: one shader pair plus its parameters.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::builtin::BuiltinShader;
use crate::{FilterError, ParamValue, ShaderSource};

/// Where a shader stage's text comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderRef {
    /// Name from the builtin library (see [`BuiltinShader`]).
    Builtin(String),
    /// File path, relative paths resolve against the preset's directory.
    Path(PathBuf),
    Inline(String),
}

impl Default for ShaderRef {
    fn default() -> Self {
        ShaderRef::Builtin(BuiltinShader::Passthrough.name().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterPreset {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub vertex: ShaderRef,

    pub fragment: ShaderRef,

    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,

    /// Preset file location; used for relative shader paths and error messages.
    #[serde(skip)]
    pub origin: Option<PathBuf>,
}

#[derive(Clone, Copy)]
enum Stage {
    Vertex,
    Fragment,
}

impl FilterPreset {
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, FilterError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| FilterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut preset: FilterPreset =
            serde_json::from_str(&text).map_err(|source| FilterError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        preset.origin = Some(path.to_path_buf());
        Ok(preset)
    }

    pub fn from_json_str(text: &str) -> Result<Self, FilterError> {
        serde_json::from_str(text).map_err(|source| FilterError::Json {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    /// Loads shader text and returns the source plus parameters in name order.
    pub fn resolve(&self) -> Result<(ShaderSource, Vec<(String, ParamValue)>), FilterError> {
        let vert = self.load(&self.vertex, Stage::Vertex)?;
        let frag = self.load(&self.fragment, Stage::Fragment)?;

        let label = match (&self.name, &self.origin) {
            (Some(n), _) => n.clone(),
            (None, Some(p)) => p.display().to_string(),
            (None, None) => "preset".to_string(),
        };
        let source = ShaderSource::new(vert, frag).with_origin(label);
        let params = self.params.iter().map(|(k, v)| (k.clone(), *v)).collect();
        Ok((source, params))
    }

    fn config_path(&self) -> PathBuf {
        self.origin.clone().unwrap_or_else(|| PathBuf::from("<inline>"))
    }

    fn load(&self, r: &ShaderRef, stage: Stage) -> Result<String, FilterError> {
        match r {
            ShaderRef::Inline(text) => Ok(text.clone()),
            ShaderRef::Builtin(name) => {
                let b = name
                    .parse::<BuiltinShader>()
                    .map_err(|msg| FilterError::InvalidConfig {
                        path: self.config_path(),
                        msg,
                    })?;
                Ok(match stage {
                    Stage::Vertex => b.vert().to_string(),
                    Stage::Fragment => b.frag().to_string(),
                })
            }
            ShaderRef::Path(p) => {
                let full = match self.origin.as_deref().and_then(Path::parent) {
                    Some(dir) if p.is_relative() => dir.join(p),
                    _ => p.clone(),
                };
                fs::read_to_string(&full).map_err(|source| FilterError::Io { path: full, source })
            }
        }
    }
}
