//! Matrix, list, bundle and array constructors.

use smallvec::SmallVec;

use genr_ir::{ExprKind, NodeId, NodeRange};
use genr_value::errors::{array_kind_mismatch, type_mismatch};
use genr_value::{
    Bundle, EvalError, EvalResult, GArray, Matrix, ObsSpan, Operand, SeriesId, Value, ValueKind,
};

use super::Evaluator;
use crate::aux::AuxId;
use crate::operators::linalg;
use crate::operators::matrix::as_matrix;

impl Evaluator<'_> {
    pub(super) fn eval_all(&mut self, nodes: &[NodeId]) -> EvalResult<SmallVec<[AuxId; 4]>> {
        nodes.iter().map(|&n| self.eval(n)).collect()
    }

    /// `{a, b; c, d}`: elements of a row are joined horizontally, rows
    /// vertically. Series become columns over the sample.
    pub(super) fn eval_matrix_lit(&mut self, pos: NodeId, rows: NodeRange) -> EvalResult<AuxId> {
        let row_nodes: SmallVec<[NodeId; 4]> = self.arena.list(rows).iter().copied().collect();
        let mut grid: SmallVec<[SmallVec<[AuxId; 4]>; 4]> = SmallVec::new();
        for row in row_nodes {
            let ExprKind::MatrixRow(elems) = self.arena.kind(row) else {
                return Err(EvalError::new("malformed matrix literal"));
            };
            let elems: SmallVec<[NodeId; 4]> = self.arena.list(elems).iter().copied().collect();
            grid.push(self.eval_all(&elems)?);
        }
        self.compute(pos, |v, ctx, out| {
            let mut result = Matrix::default();
            let mut has_series = false;
            for row in &grid {
                let mut joined = Matrix::default();
                for &id in row {
                    let op = v.get(id)?;
                    has_series |= matches!(op, Operand::Series(_));
                    let m = as_matrix(op, ctx)
                        .ok_or_else(|| type_mismatch("matrix element", op.kind()))?;
                    joined = linalg::hcat(&joined, &m)?;
                }
                result = linalg::vcat(&result, &joined)?;
            }
            if has_series {
                let (t1, t2) = ctx.sample();
                result.set_span(Some(ObsSpan { t1, t2 }));
            }
            *out = Value::Matrix(result);
            Ok(())
        })
    }

    /// List constructor: series, lists and numeric series ids.
    pub(super) fn eval_list_lit(&mut self, pos: NodeId, elems: NodeRange) -> EvalResult<AuxId> {
        let nodes: SmallVec<[NodeId; 4]> = self.arena.list(elems).iter().copied().collect();
        let ids = self.eval_all(&nodes)?;
        self.compute(pos, |v, ctx, out| {
            let list = out.list_buf();
            for &id in &ids {
                match v.get(id)? {
                    Operand::Series(s) => match s.id {
                        Some(sid) => list.push(sid),
                        None => {
                            return Err(type_mismatch("named series in list", ValueKind::Series));
                        }
                    },
                    Operand::List(l) => list.append(l),
                    op => {
                        let sid = op
                            .scalar()
                            .filter(|x| x.fract() == 0.0 && *x >= 0.0)
                            .and_then(|x| SeriesId::from_index(x as usize))
                            .filter(|sid| sid.index() < ctx.ds.num_series())
                            .ok_or_else(|| type_mismatch("series or series id", op.kind()))?;
                        list.push(sid);
                    }
                }
            }
            Ok(())
        })
    }

    /// `_(key=value, ...)`. `null` values are skipped.
    pub(super) fn eval_bundle_lit(&mut self, pos: NodeId, pairs: NodeRange) -> EvalResult<AuxId> {
        let nodes: SmallVec<[NodeId; 8]> = self.arena.list(pairs).iter().copied().collect();
        let mut entries: SmallVec<[(String, AuxId); 4]> = SmallVec::new();
        for pair in nodes.chunks(2) {
            let [key, value] = pair else {
                return Err(EvalError::new("bundle literal needs key=value pairs"));
            };
            let ExprKind::Str(k) = self.arena.kind(*key) else {
                return Err(EvalError::new("bundle key must be a name"));
            };
            let key = self.arena.str(k).to_owned();
            entries.push((key, self.eval(*value)?));
        }
        self.compute(pos, |v, _, out| {
            if !matches!(out, Value::Bundle(_)) {
                *out = Value::Bundle(Bundle::new());
            }
            let Value::Bundle(bundle) = out else {
                unreachable!()
            };
            bundle.clear();
            for (key, id) in &entries {
                let value = v.get(*id)?;
                if !matches!(value, Operand::Undefined) {
                    bundle.insert(key.clone(), value.to_value());
                }
            }
            Ok(())
        })
    }

    /// `defarray(...)`: the first element fixes the kind.
    pub(super) fn eval_array_lit(&mut self, pos: NodeId, elems: NodeRange) -> EvalResult<AuxId> {
        let nodes: SmallVec<[NodeId; 4]> = self.arena.list(elems).iter().copied().collect();
        let ids = self.eval_all(&nodes)?;
        self.compute(pos, |v, _, out| {
            let mut array = GArray::new();
            for &id in &ids {
                let value = v.get(id)?;
                if value.array_kind().is_none() {
                    return Err(array_kind_mismatch(array.kind(), value.kind()));
                }
                array.push(value.to_value())?;
            }
            *out = Value::Array(array);
            Ok(())
        })
    }
}
