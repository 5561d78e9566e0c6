#![forbid(unsafe_code)]

use std::collections::HashMap;

use crate::error::ModelError;
use crate::node::CompilationUnit;
use crate::types::TypeDecl;

/// Read-only view of resolved declarations consumed by the verifier.
pub trait ProgramModel {
    /// Look up a declaration by fully qualified name.
    fn lookup(&self, qualified_name: &str) -> Option<&TypeDecl>;
}

/// In-memory program model.
#[derive(Clone, Debug, Default)]
pub struct Program {
    types: Vec<TypeDecl>,
    index: HashMap<String, usize>,
    units: Vec<CompilationUnit>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, decl: TypeDecl) -> Result<(), ModelError> {
        if self.index.contains_key(&decl.name) {
            return Err(ModelError::DuplicateType { name: decl.name });
        }
        self.index.insert(decl.name.clone(), self.types.len());
        self.types.push(decl);
        Ok(())
    }

    pub fn with_type(mut self, decl: TypeDecl) -> Result<Self, ModelError> {
        self.add_type(decl)?;
        Ok(self)
    }

    pub fn add_unit(&mut self, unit: CompilationUnit) {
        self.units.push(unit);
    }

    pub fn types(&self) -> &[TypeDecl] {
        &self.types
    }

    pub fn units(&self) -> &[CompilationUnit] {
        &self.units
    }
}

impl ProgramModel for Program {
    fn lookup(&self, qualified_name: &str) -> Option<&TypeDecl> {
        self.index.get(qualified_name).map(|&i| &self.types[i])
    }
}

impl<M: ProgramModel + ?Sized> ProgramModel for &M {
    fn lookup(&self, qualified_name: &str) -> Option<&TypeDecl> {
        (**self).lookup(qualified_name)
    }
}
