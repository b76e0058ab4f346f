use std::fmt;

use parrec_core::FactorMatrix;
use serde::{Deserialize, Serialize};

use crate::errors::MatchError;
use crate::matcher::{dot_topn, MatchResults};

/// Matrix-factorization model families served by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Als,
    Bpr,
    W2v,
    Cfr,
}

impl ModelKind {
    fn supports_similarity(self) -> bool {
        // TODO: route CFR context factors once their row layout is settled.
        !matches!(self, Self::Cfr)
    }

    fn supports_recommendation(self) -> bool {
        matches!(self, Self::Als)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Als => "als",
            Self::Bpr => "bpr",
            Self::W2v => "w2v",
            Self::Cfr => "cfr",
        };
        f.write_str(name)
    }
}

/// Factor groups a query can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    User,
    Item,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::User => "user",
            Self::Item => "item",
        };
        f.write_str(name)
    }
}

/// Factor matrices of one trained model, plus caller-declared normalization
/// state.
///
/// Training, id mapping and normalization happen upstream; this type only
/// carries the resulting dense matrices and the flags the dispatch layer
/// needs to enforce operation semantics.
#[derive(Debug, Clone)]
pub struct ModelFactors {
    kind: ModelKind,
    user: Option<FactorMatrix>,
    item: FactorMatrix,
    user_normalized: bool,
    item_normalized: bool,
}

impl ModelFactors {
    /// Builds an ALS model from user and item factor matrices.
    pub fn als(user: FactorMatrix, item: FactorMatrix) -> Result<Self, MatchError> {
        Self::with_user(ModelKind::Als, user, item)
    }

    /// Builds a BPR model from user and item factor matrices.
    pub fn bpr(user: FactorMatrix, item: FactorMatrix) -> Result<Self, MatchError> {
        Self::with_user(ModelKind::Bpr, user, item)
    }

    /// Builds a Word2Vec-like model from its vocabulary vectors.
    pub fn w2v(item: FactorMatrix) -> Self {
        Self::item_only(ModelKind::W2v, item)
    }

    /// Builds a CFR model from its item factors.
    pub fn cfr(item: FactorMatrix) -> Self {
        Self::item_only(ModelKind::Cfr, item)
    }

    fn with_user(
        kind: ModelKind,
        user: FactorMatrix,
        item: FactorMatrix,
    ) -> Result<Self, MatchError> {
        if user.dim() != item.dim() {
            return Err(MatchError::DimensionMismatch {
                query: user.dim(),
                candidate: item.dim(),
            });
        }
        Ok(Self {
            kind,
            user: Some(user),
            item,
            user_normalized: false,
            item_normalized: false,
        })
    }

    fn item_only(kind: ModelKind, item: FactorMatrix) -> Self {
        Self {
            kind,
            user: None,
            item,
            user_normalized: false,
            item_normalized: false,
        }
    }

    /// Declares the factors of `group` as L2-normalized.
    ///
    /// Normalization itself happens upstream; the flag makes the dispatch
    /// layer refuse operations whose ranking semantics it would change.
    pub fn with_normalized(mut self, group: Group) -> Self {
        match group {
            Group::User => self.user_normalized = true,
            Group::Item => self.item_normalized = true,
        }
        self
    }

    /// Returns the model family.
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Returns whether the factors of `group` were declared normalized.
    pub fn is_normalized(&self, group: Group) -> bool {
        match group {
            Group::User => self.user_normalized,
            Group::Item => self.item_normalized,
        }
    }

    fn factors(&self, group: Group) -> Result<&FactorMatrix, MatchError> {
        match group {
            Group::Item => Ok(&self.item),
            Group::User => self
                .user
                .as_ref()
                .ok_or(MatchError::MissingFactors { group }),
        }
    }
}

/// Worker configuration for the matcher.
///
/// Always passed explicitly; the engine never reads an ambient worker count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherOptions {
    pub num_workers: usize,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self { num_workers: 1 }
    }
}

/// Routes model-level queries onto the shared parallel top-k kernel.
#[derive(Debug, Clone)]
pub struct ParallelMatcher {
    options: MatcherOptions,
}

impl ParallelMatcher {
    /// Creates a matcher with a validated worker configuration.
    pub fn new(options: MatcherOptions) -> Result<Self, MatchError> {
        if options.num_workers == 0 {
            return Err(MatchError::InvalidWorkerCount);
        }
        Ok(Self { options })
    }

    /// Returns the matcher configuration.
    pub fn options(&self) -> MatcherOptions {
        self.options
    }

    /// Finds the `topk` most similar rows within one factor group.
    ///
    /// Query and candidate rows come from the same matrix, so each query row
    /// usually scores itself highest; callers not wanting self-matches
    /// restrict `pool` or skip the row downstream. Scores are plain dot
    /// products; callers wanting cosine semantics supply pre-normalized
    /// factors.
    ///
    /// `pool` follows the caller contract: `None` means the whole group is
    /// eligible, while an explicitly requested pool that resolved to zero
    /// rows is an [`MatchError::EmptyPool`] error.
    pub fn most_similar(
        &self,
        model: &ModelFactors,
        group: Group,
        query_indexes: &[i32],
        topk: usize,
        pool: Option<&[i32]>,
    ) -> Result<MatchResults, MatchError> {
        if !model.kind().supports_similarity() {
            return Err(MatchError::UnsupportedOperation {
                model: model.kind(),
                operation: "most_similar",
            });
        }
        let factors = model.factors(group)?;
        let pool = resolve_pool(pool)?;

        tracing::debug!(
            model = %model.kind(),
            %group,
            queries = query_indexes.len(),
            topk,
            pool = pool.len(),
            "most_similar"
        );
        dot_topn(
            query_indexes,
            factors,
            factors,
            pool,
            topk,
            self.options.num_workers,
        )
    }

    /// Ranks the `topk` best item rows for each query user row.
    ///
    /// Refused for models whose factors were declared normalized: a dot
    /// product over normalized factors no longer ranks by affinity.
    pub fn topk_recommendation(
        &self,
        model: &ModelFactors,
        query_indexes: &[i32],
        topk: usize,
        pool: Option<&[i32]>,
    ) -> Result<MatchResults, MatchError> {
        if !model.kind().supports_recommendation() {
            return Err(MatchError::UnsupportedOperation {
                model: model.kind(),
                operation: "topk_recommendation",
            });
        }
        if model.is_normalized(Group::User) || model.is_normalized(Group::Item) {
            return Err(MatchError::NormalizedFactors);
        }
        let user = model.factors(Group::User)?;
        let item = model.factors(Group::Item)?;
        let pool = resolve_pool(pool)?;

        tracing::debug!(
            model = %model.kind(),
            queries = query_indexes.len(),
            topk,
            pool = pool.len(),
            "topk_recommendation"
        );
        dot_topn(
            query_indexes,
            user,
            item,
            pool,
            topk,
            self.options.num_workers,
        )
    }
}

fn resolve_pool(pool: Option<&[i32]>) -> Result<&[i32], MatchError> {
    match pool {
        None => Ok(&[]),
        Some([]) => Err(MatchError::EmptyPool),
        Some(indexes) => Ok(indexes),
    }
}
