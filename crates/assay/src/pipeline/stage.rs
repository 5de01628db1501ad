//! Stage and operator traits, declared signatures and stage outputs.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::marker::PhantomData;

use crate::error::Result;
use crate::table::{NonEmptyTable, Table};

/// Declared type of a stage parameter or return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// Any table, including an empty one.
    Table,
    /// A table with at least one row.
    NonEmptyTable,
    /// Anything else, named by its type.
    Other(String),
}

impl ParamKind {
    pub fn other(name: impl Into<String>) -> Self {
        ParamKind::Other(name.into())
    }

    /// The kind describing a Rust type.
    pub fn of<T: Any>() -> Self {
        if TypeId::of::<T>() == TypeId::of::<Table>() {
            ParamKind::Table
        } else if TypeId::of::<T>() == TypeId::of::<NonEmptyTable>() {
            ParamKind::NonEmptyTable
        } else {
            ParamKind::Other(type_name::<T>().to_string())
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, ParamKind::Table | ParamKind::NonEmptyTable)
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Table => write!(f, "Table"),
            ParamKind::NonEmptyTable => write!(f, "NonEmptyTable"),
            ParamKind::Other(name) => write!(f, "{}", name),
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    /// Pre-bound configuration; the pipeline never supplies it.
    pub bound: bool,
}

impl Param {
    /// A parameter the pipeline supplies on every call.
    pub fn free(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            bound: false,
        }
    }

    /// A parameter fixed when the stage was built.
    pub fn bound(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            bound: true,
        }
    }
}

/// The full declared call surface of a stage, including bound parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub params: Vec<Param>,
    /// Declared return type; `None` when undeclared.
    pub returns: Option<ParamKind>,
}

impl Signature {
    /// A signature with no parameters and no declared return type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: None,
        }
    }

    /// The usual operator shape: `(input: NonEmptyTable, ...) -> Table`.
    pub fn operator(name: impl Into<String>) -> Self {
        Self::new(name)
            .param(Param::free("input", ParamKind::NonEmptyTable))
            .returns(ParamKind::Table)
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Append a bound configuration parameter.
    pub fn bind(self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.param(Param::bound(name, kind))
    }

    pub fn returns(mut self, kind: ParamKind) -> Self {
        self.returns = Some(kind);
        self
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                if p.bound {
                    format!("{}: {} = <bound>", p.name, p.kind)
                } else {
                    format!("{}: {}", p.name, p.kind)
                }
            })
            .collect();
        write!(f, "{}({})", self.name, params.join(", "))?;
        if let Some(ret) = &self.returns {
            write!(f, " -> {}", ret)?;
        }
        Ok(())
    }
}

/// Whatever a stage produced, checked by the pipeline before it moves on.
pub struct StageOutput {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl StageOutput {
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: short_type_name::<T>(),
        }
    }

    /// Name of the produced type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Recover the table, or the produced type name when it is not one.
    ///
    /// Accepts every kind [`ParamKind::is_table`] accepts.
    pub fn into_table(self) -> std::result::Result<Table, &'static str> {
        let type_name = self.type_name;
        match self.value.downcast::<Table>() {
            Ok(table) => Ok(*table),
            Err(value) => value
                .downcast::<NonEmptyTable>()
                .map(|t| (*t).into_inner())
                .map_err(|_| type_name),
        }
    }
}

impl From<Table> for StageOutput {
    fn from(table: Table) -> Self {
        StageOutput::new(table)
    }
}

impl fmt::Debug for StageOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageOutput")
            .field("type_name", &self.type_name)
            .finish()
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    match full.find('<') {
        Some(generic_start) => full[..generic_start]
            .rsplit("::")
            .next()
            .unwrap_or(full),
        None => full.rsplit("::").next().unwrap_or(full),
    }
}

/// A type-erased pipeline element.
pub trait Stage: Send + Sync {
    /// Declared call surface, checked when the stage enters a pipeline.
    fn signature(&self) -> Signature;

    /// Run the stage on the current table.
    fn call(&self, table: Table) -> Result<StageOutput>;

    fn name(&self) -> String {
        self.signature().name
    }
}

/// A configured table-to-table operator.
///
/// Configuration is validated when the operator is built; `transform` only
/// ever sees a non-empty table.
pub trait Operator: Send + Sync {
    fn signature(&self) -> Signature;

    fn transform(&self, input: NonEmptyTable) -> Result<Table>;
}

/// Adapter turning an [`Operator`] into a [`Stage`].
pub struct OperatorStage<O>(O);

impl<O: Operator + 'static> OperatorStage<O> {
    pub fn new(operator: O) -> Self {
        Self(operator)
    }

    pub fn boxed(operator: O) -> Box<dyn Stage> {
        Box::new(Self(operator))
    }

    pub fn operator(&self) -> &O {
        &self.0
    }
}

impl<O: Operator> Stage for OperatorStage<O> {
    fn signature(&self) -> Signature {
        self.0.signature()
    }

    fn call(&self, table: Table) -> Result<StageOutput> {
        let input = NonEmptyTable::new(table)?;
        Ok(self.0.transform(input)?.into())
    }
}

/// A stage backed by a closure.
///
/// `FnStage::new` derives the signature from the closure's types. A custom
/// signature can be declared with [`FnStage::with_signature`]; the pipeline
/// then trusts it at construction and checks the real output at run time.
pub struct FnStage<F, R> {
    signature: Signature,
    f: F,
    _output: PhantomData<fn() -> R>,
}

impl<F, R> FnStage<F, R>
where
    F: Fn(Table) -> Result<R> + Send + Sync + 'static,
    R: Any + Send,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        let signature = Signature::new(name)
            .param(Param::free("table", ParamKind::Table))
            .returns(ParamKind::of::<R>());
        Self::with_signature(signature, f)
    }

    pub fn with_signature(signature: Signature, f: F) -> Self {
        Self {
            signature,
            f,
            _output: PhantomData,
        }
    }

    pub fn boxed(self) -> Box<dyn Stage> {
        Box::new(self)
    }
}

impl<F, R> Stage for FnStage<F, R>
where
    F: Fn(Table) -> Result<R> + Send + Sync,
    R: Any + Send,
{
    fn signature(&self) -> Signature {
        self.signature.clone()
    }

    fn call(&self, table: Table) -> Result<StageOutput> {
        (self.f)(table).map(StageOutput::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_kind_of() {
        assert_eq!(ParamKind::of::<Table>(), ParamKind::Table);
        assert_eq!(ParamKind::of::<NonEmptyTable>(), ParamKind::NonEmptyTable);
        assert!(!ParamKind::of::<usize>().is_table());
    }

    #[test]
    fn test_stage_output_round_trip() {
        let out = StageOutput::from(Table::new());
        assert_eq!(out.type_name(), "Table");
        assert!(out.into_table().is_ok());

        let non_empty = NonEmptyTable::new(
            Table::from_columns(vec![("a", crate::table::column([1]))]).unwrap(),
        )
        .unwrap();
        let out = StageOutput::new(non_empty);
        assert_eq!(out.type_name(), "NonEmptyTable");
        assert_eq!(out.into_table().unwrap().row_count(), 1);

        let out = StageOutput::new(vec![1u8]);
        assert_eq!(out.type_name(), "Vec");
        assert_eq!(out.into_table().unwrap_err(), "Vec");
    }

    #[test]
    fn test_signature_display() {
        let sig = Signature::operator("check").bind("columns", ParamKind::other("ColumnList"));
        assert_eq!(
            sig.to_string(),
            "check(input: NonEmptyTable, columns: ColumnList = <bound>) -> Table"
        );
    }

    #[test]
    fn test_fn_stage_signature_from_types() {
        let stage = FnStage::new("count_rows", |t: Table| Ok(t.row_count()));
        let sig = stage.signature();
        assert_eq!(sig.params.len(), 1);
        assert_eq!(sig.returns, Some(ParamKind::Other("usize".to_string())));
    }
}
