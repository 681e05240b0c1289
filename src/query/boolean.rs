//! Postfix boolean queries over the incidence matrix
//!
//! `a b AND c OR NOT` reads as `NOT ((a AND b) OR c)`. Operators are
//! uppercase only; every other token is an operand and goes through the
//! tokenizer, so `Java,` and `java` are the same operand.

use roaring::RoaringBitmap;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::QueryError;
use crate::index::{DocumentRegistry, IncidenceMatrix};
use crate::utils::tokenizer::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    And,
    Or,
    Not,
}

impl Operator {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "AND" => Some(Operator::And),
            "OR" => Some(Operator::Or),
            "NOT" => Some(Operator::Not),
            _ => None,
        }
    }

    fn arity(self) -> usize {
        match self {
            Operator::Not => 1,
            Operator::And | Operator::Or => 2,
        }
    }
}

pub struct BooleanQueryEvaluator {
    matrix: Arc<IncidenceMatrix>,
    registry: Arc<DocumentRegistry>,
}

impl BooleanQueryEvaluator {
    pub fn new(matrix: Arc<IncidenceMatrix>, registry: Arc<DocumentRegistry>) -> Self {
        Self { matrix, registry }
    }

    /// Every document id assigned so far
    fn universe(&self) -> RoaringBitmap {
        let mut universe = RoaringBitmap::new();
        if let Some(max) = self.registry.max_document_id() {
            universe.insert_range(0..=max);
        }
        universe
    }

    /// Intersection of the vectors of every term the operand normalizes to
    fn operand(&self, token: &str, universe: &RoaringBitmap) -> RoaringBitmap {
        normalize(token)
            .iter()
            .fold(universe.clone(), |acc, term| acc & self.matrix.vector_for(term))
    }

    /// Evaluate to a set of document ids
    pub fn evaluate_ids(&self, query: &str) -> Result<RoaringBitmap, QueryError> {
        let universe = self.universe();
        let mut stack: Vec<RoaringBitmap> = Vec::new();
        let mut seen_token = false;

        for token in query.split_whitespace() {
            seen_token = true;

            let Some(op) = Operator::parse(token) else {
                stack.push(self.operand(token, &universe));
                continue;
            };

            if stack.len() < op.arity() {
                return Err(QueryError::StackUnderflow {
                    token: token.to_string(),
                });
            }

            let result = match op {
                Operator::Not => {
                    let v = stack.pop().unwrap_or_default();
                    &universe - v
                }
                Operator::And | Operator::Or => {
                    let right = stack.pop().unwrap_or_default();
                    let left = stack.pop().unwrap_or_default();
                    if op == Operator::And {
                        left & right
                    } else {
                        left | right
                    }
                }
            };
            stack.push(result);
        }

        if !seen_token {
            return Err(QueryError::EmptyQuery);
        }

        match stack.len() {
            1 => Ok(stack.pop().unwrap_or_default()),
            remaining => Err(QueryError::StackOverflow { remaining }),
        }
    }

    /// Evaluate to the paths of the matching documents
    pub fn evaluate(&self, query: &str) -> Result<HashSet<PathBuf>, QueryError> {
        let ids = self.evaluate_ids(query)?;
        Ok(ids
            .iter()
            .filter_map(|id| self.registry.document_path(id))
            .collect())
    }
}
