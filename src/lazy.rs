// src/lazy.rs
//! Deferred raster expressions.
//!
//! A [`RasterHandle`] describes how to compute a raster without computing
//! it. Pixels only exist after an explicit [`RasterHandle::evaluate`] or
//! [`RasterHandle::sample`], and each call evaluates the whole expression
//! again against the source.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info_span};

use crate::collection::CollectionQuery;
use crate::error::Result;
use crate::geometry::Region;
use crate::processing::band_math::{band_math_binary, band_math_scalar, BandMathOp};
use crate::processing::clip::clip;
use crate::processing::reduce::{reduce_temporal, Reducer};
use crate::processing::ParallelProcessor;
use crate::raster::Raster;
use crate::source::ImageSource;

/// What a forcing call needs: where scenes come from and how to load them
pub struct EvalContext<'a> {
    source: &'a dyn ImageSource,
    processor: ParallelProcessor,
}

impl<'a> EvalContext<'a> {
    pub fn new(source: &'a dyn ImageSource, processor: ParallelProcessor) -> Self {
        Self { source, processor }
    }

    pub fn source(&self) -> &'a dyn ImageSource {
        self.source
    }

    pub fn processor(&self) -> &ParallelProcessor {
        &self.processor
    }
}

/// Result of forcing a handle. Constants stay scalar until combined with a grid.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    Constant(f64),
    Raster(Raster),
}

impl Evaluated {
    pub fn into_raster(self) -> Option<Raster> {
        match self {
            Evaluated::Raster(raster) => Some(raster),
            Evaluated::Constant(_) => None,
        }
    }
}

enum Expr {
    Constant(f64),
    Reduce {
        query: CollectionQuery,
        band: String,
        reducer: Reducer,
    },
    Clip {
        input: RasterHandle,
        region: Region,
    },
    Binary {
        op: BandMathOp,
        lhs: RasterHandle,
        rhs: RasterHandle,
    },
}

#[derive(Clone)]
pub struct RasterHandle(Arc<Expr>);

impl RasterHandle {
    /// Spatially uniform raster
    pub fn constant(value: f64) -> Self {
        Self(Arc::new(Expr::Constant(value)))
    }

    /// Per-pixel reduction of one band across a collection
    pub fn reduce(query: CollectionQuery, band: &str, reducer: Reducer) -> Self {
        Self(Arc::new(Expr::Reduce {
            query,
            band: band.to_string(),
            reducer,
        }))
    }

    pub fn clip(&self, region: &Region) -> Self {
        Self(Arc::new(Expr::Clip {
            input: self.clone(),
            region: region.clone(),
        }))
    }

    pub fn add(&self, other: &RasterHandle) -> Self {
        self.binary(BandMathOp::Add, other)
    }

    pub fn multiply(&self, factor: f64) -> Self {
        self.binary(BandMathOp::Multiply, &RasterHandle::constant(factor))
    }

    fn binary(&self, op: BandMathOp, other: &RasterHandle) -> Self {
        Self(Arc::new(Expr::Binary {
            op,
            lhs: self.clone(),
            rhs: other.clone(),
        }))
    }

    /// Force the expression
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Evaluated> {
        let _span = info_span!("evaluate", expr = %self).entered();

        match self.0.as_ref() {
            Expr::Constant(value) => Ok(Evaluated::Constant(*value)),
            Expr::Reduce {
                query,
                band,
                reducer,
            } => {
                let collection = query.evaluate(ctx)?;
                debug!(images = collection.len(), band = %band, "Reducing collection");
                Ok(Evaluated::Raster(reduce_temporal(&collection, band, *reducer)?))
            }
            Expr::Clip { input, region } => Ok(match input.evaluate(ctx)? {
                // A constant has no grid to clip
                constant @ Evaluated::Constant(_) => constant,
                Evaluated::Raster(raster) => Evaluated::Raster(clip(&raster, region)?),
            }),
            Expr::Binary { op, lhs, rhs } => {
                Ok(match (lhs.evaluate(ctx)?, rhs.evaluate(ctx)?) {
                    (Evaluated::Constant(a), Evaluated::Constant(b)) => {
                        Evaluated::Constant(op.apply(a, b))
                    }
                    (Evaluated::Raster(r), Evaluated::Constant(c))
                    | (Evaluated::Constant(c), Evaluated::Raster(r)) => {
                        Evaluated::Raster(band_math_scalar(&r, c, *op)?)
                    }
                    (Evaluated::Raster(a), Evaluated::Raster(b)) => {
                        Evaluated::Raster(band_math_binary(&a, &b, *op)?)
                    }
                })
            }
        }
    }

    /// Force the expression and read the pixel containing (x, y).
    ///
    /// `Ok(None)` when that pixel is NoData.
    pub fn sample(&self, ctx: &EvalContext<'_>, x: f64, y: f64) -> Result<Option<f64>> {
        match self.evaluate(ctx)? {
            Evaluated::Constant(value) => Ok(Some(value)),
            Evaluated::Raster(raster) => raster.sample(x, y),
        }
    }
}

impl fmt::Display for RasterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_ref() {
            Expr::Constant(value) => write!(f, "{value}"),
            Expr::Reduce { band, reducer, .. } => write!(f, "{}({band})", reducer.name()),
            Expr::Clip { input, .. } => write!(f, "clip({input})"),
            Expr::Binary { op, lhs, rhs } => match op {
                BandMathOp::Add => write!(f, "({lhs} + {rhs})"),
                BandMathOp::Multiply => write!(f, "{lhs} * {rhs}"),
            },
        }
    }
}

impl fmt::Debug for RasterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RasterHandle({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn ctx(source: &MemorySource) -> EvalContext<'_> {
        EvalContext::new(source, ParallelProcessor::new(Some(1)))
    }

    #[test]
    fn constants_fold_without_a_source() {
        let source = MemorySource::new();
        let handle = RasterHandle::constant(1.1)
            .add(&RasterHandle::constant(1.1).multiply(0.3))
            .clip(&Region::lake_urmia());

        match handle.evaluate(&ctx(&source)).unwrap() {
            Evaluated::Constant(value) => assert!((value - 1.43).abs() < 1e-12),
            other => panic!("expected constant, got {other:?}"),
        }
        assert_eq!(handle.sample(&ctx(&source), 45.3, 37.7).unwrap().map(|v| (v * 100.0).round()), Some(143.0));
    }

    #[test]
    fn unknown_collection_surfaces_on_evaluate_only() {
        let source = MemorySource::new();
        let handle = RasterHandle::reduce(CollectionQuery::new("MISSING"), "NDWI", Reducer::Mean);
        // Building the handle did not touch the source
        assert!(handle.evaluate(&ctx(&source)).is_err());
    }

    #[test]
    fn display_shows_expression() {
        let handle = RasterHandle::constant(2.0).multiply(0.5);
        assert_eq!(handle.to_string(), "2 * 0.5");
    }
}
