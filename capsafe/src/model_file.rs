#![forbid(unsafe_code)]
#![allow(unused_assignments)]

//! JSON description of a resolved program, as produced by a front end.
//!
//! ```json
//! {
//!   "types": [
//!     { "name": "app.Money", "kind": "class", "traits": ["Powerless"],
//!       "superclass": "app.Base", "span": [120, 5],
//!       "fields": [ { "name": "cents", "type": "long", "final": true, "span": [150, 5] } ] }
//!   ],
//!   "units": [
//!     { "name": "app/Money.java", "source": "src/app/Money.java",
//!       "packages": [ { "name": "app", "span": [0, 12] } ],
//!       "types": ["app.Money"],
//!       "body": [ { "kind": "equality", "op": "==", "span": [300, 6],
//!                   "lhs": { "kind": "expr", "type": "java.lang.String", "span": [300, 1] },
//!                   "rhs": { "kind": "expr", "type": "java.lang.String", "span": [305, 1] } } ] }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use capsafe_model::{
    CompilationUnit, EqOp, Field, MarkerSet, MarkerTrait, ModelError, Node, Program, Spanned,
    TypeDecl, TypeKind, TypeRef, span,
};
use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ModelFileError {
    #[error("failed to read {path}: {message}")]
    #[diagnostic(code(capsafe::model_file::io))]
    Io { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    #[diagnostic(code(capsafe::model_file::parse))]
    Parse { path: String, message: String },

    #[error("in {path}: {source}")]
    #[diagnostic(code(capsafe::model_file::invalid))]
    Invalid {
        path: String,
        #[source]
        source: ModelError,
    },
}

/// A loaded model plus where each unit's source text lives, if known.
#[derive(Debug)]
pub struct LoadedModel {
    pub program: Program,
    /// Parallel to `program.units()`.
    pub sources: Vec<Option<PathBuf>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelFile {
    #[serde(default)]
    types: Vec<TypeEntry>,
    #[serde(default)]
    units: Vec<UnitEntry>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
struct RangeEntry(usize, usize);

impl RangeEntry {
    fn span(self) -> capsafe_model::Span {
        span(self.0, self.1)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum KindEntry {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
}

impl From<KindEntry> for TypeKind {
    fn from(k: KindEntry) -> Self {
        match k {
            KindEntry::Class => TypeKind::Class,
            KindEntry::Interface => TypeKind::Interface,
            KindEntry::Enum => TypeKind::Enum,
            KindEntry::Annotation => TypeKind::Annotation,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeEntry {
    name: String,
    #[serde(default)]
    kind: KindEntry,
    #[serde(default)]
    traits: Vec<String>,
    #[serde(default)]
    superclass: Option<String>,
    #[serde(default)]
    interfaces: Vec<String>,
    #[serde(default)]
    enclosing: Option<String>,
    #[serde(default, rename = "static")]
    is_static: bool,
    #[serde(default)]
    builtin: bool,
    #[serde(default)]
    span: RangeEntry,
    #[serde(default)]
    fields: Vec<FieldEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldEntry {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default, rename = "final")]
    is_final: bool,
    #[serde(default, rename = "static")]
    is_static: bool,
    #[serde(default)]
    synthetic: bool,
    #[serde(default)]
    enum_constant: bool,
    #[serde(default)]
    span: RangeEntry,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnitEntry {
    name: String,
    #[serde(default)]
    source: Option<PathBuf>,
    #[serde(default)]
    packages: Vec<PackageEntry>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    body: Vec<NodeEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PackageEntry {
    name: String,
    #[serde(default)]
    span: RangeEntry,
}

#[derive(Clone, Copy, Debug, Deserialize)]
enum OpEntry {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum NodeEntry {
    Equality {
        op: OpEntry,
        #[serde(default)]
        span: RangeEntry,
        lhs: Box<NodeEntry>,
        rhs: Box<NodeEntry>,
    },
    Method {
        name: String,
        #[serde(default)]
        name_span: RangeEntry,
        #[serde(default)]
        span: RangeEntry,
        #[serde(default)]
        native: bool,
        #[serde(default)]
        body: Vec<NodeEntry>,
    },
    Expr {
        #[serde(default)]
        span: RangeEntry,
        /// Missing when the front end could not resolve the type.
        #[serde(default, rename = "type")]
        ty: Option<String>,
        #[serde(default)]
        children: Vec<NodeEntry>,
    },
}

pub fn load_model(path: &Path) -> Result<LoadedModel, ModelFileError> {
    let display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|e| ModelFileError::Io {
        path: display.clone(),
        message: e.to_string(),
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse_model(&raw, base).map_err(|e| match e {
        ModelFileError::Parse { message, .. } => ModelFileError::Parse {
            path: display.clone(),
            message,
        },
        ModelFileError::Invalid { source, .. } => ModelFileError::Invalid {
            path: display.clone(),
            source,
        },
        other => other,
    })
}

/// Parse a model description; relative `source` paths resolve against `base`.
pub fn parse_model(raw: &str, base: &Path) -> Result<LoadedModel, ModelFileError> {
    let parsed: ModelFile = serde_json::from_str(raw).map_err(|e| ModelFileError::Parse {
        path: "<input>".to_string(),
        message: e.to_string(),
    })?;
    let invalid = |source: ModelError| ModelFileError::Invalid {
        path: "<input>".to_string(),
        source,
    };

    let mut program = Program::new();
    for entry in parsed.types {
        program.add_type(type_decl(entry).map_err(invalid)?).map_err(invalid)?;
    }

    let mut sources = Vec::with_capacity(parsed.units.len());
    for unit in parsed.units {
        sources.push(unit.source.as_ref().map(|s| base.join(s)));
        let mut cu = CompilationUnit::new(unit.name);
        for pkg in unit.packages {
            cu.packages.push(Spanned::new(pkg.span.span(), pkg.name));
        }
        cu.types = unit.types;
        for node in unit.body {
            cu.body.push(node_from(node).map_err(invalid)?);
        }
        program.add_unit(cu);
    }

    Ok(LoadedModel { program, sources })
}

fn type_decl(entry: TypeEntry) -> Result<TypeDecl, ModelError> {
    let traits = entry
        .traits
        .iter()
        .map(|t| t.parse::<MarkerTrait>())
        .collect::<Result<MarkerSet, _>>()?;
    let mut decl = TypeDecl::new(entry.name, entry.kind.into());
    decl.traits = traits;
    decl.superclass = entry.superclass;
    decl.interfaces = entry.interfaces;
    decl.enclosing = entry.enclosing;
    decl.is_static_member = entry.is_static;
    decl.is_builtin = entry.builtin;
    decl.name_span = entry.span.span();
    for f in entry.fields {
        decl.fields.push(Field {
            name: Spanned::new(f.span.span(), f.name),
            ty: f.ty.parse::<TypeRef>()?,
            is_final: f.is_final,
            is_static: f.is_static,
            is_synthetic: f.synthetic,
            is_enum_constant: f.enum_constant,
        });
    }
    Ok(decl)
}

fn node_from(entry: NodeEntry) -> Result<Node, ModelError> {
    Ok(match entry {
        NodeEntry::Equality { op, span, lhs, rhs } => {
            let op = match op {
                OpEntry::Eq => EqOp::Eq,
                OpEntry::Ne => EqOp::Ne,
            };
            Node::equality(span.span(), op, node_from(*lhs)?, node_from(*rhs)?)
        }
        NodeEntry::Method {
            name,
            name_span,
            span,
            native,
            body,
        } => Node::method(
            span.span(),
            Spanned::new(name_span.span(), name),
            native,
            body.into_iter().map(node_from).collect::<Result<_, _>>()?,
        ),
        NodeEntry::Expr { span, ty, children } => {
            let children = children.into_iter().map(node_from).collect::<Result<Vec<_>, _>>()?;
            let mut node = Node::block(span.span(), children);
            node.ty = ty.map(|t| t.parse::<TypeRef>()).transpose()?;
            node
        }
    })
}
