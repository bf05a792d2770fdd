//! Positional store shared by blocks (scoped by page) and layers (scoped by
//! zero-block).
//!
//! Every positioned row belongs to a sibling scope and carries an integer
//! `position`. Three mutation strategies exist and each service picks one
//! explicitly for each operation:
//!
//! - `compact_shift`: after a delete, every sibling above the removed
//!   position moves down by one, closing the gap.
//! - `swap`: a move onto an occupied position exchanges positions with the
//!   occupant. Exactly one other row is touched.
//! - `direct_overwrite`: the stored position is replaced as-is, without
//!   collision checks or sibling renumbering.
//!
//! Creation never compacts: positions may contain gaps, only collisions are
//! rejected (see [`ensure_free`]).

use sea_orm::sea_query::{CaseStatement, Expr};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};

use crate::db::entities::{block, zero_layer};
use crate::db::unix_now;
use crate::error::{Result, ServerError};

/// An entity whose rows are ordered within a parent scope
pub trait Positioned: EntityTrait {
    /// Human-readable scope name used in errors and logs
    const SCOPE: &'static str;

    fn id_column() -> Self::Column;
    fn scope_column() -> Self::Column;
    fn position_column() -> Self::Column;
    fn updated_at_column() -> Self::Column;

    fn id_of(model: &Self::Model) -> i32;
    fn scope_of(model: &Self::Model) -> i32;
    fn position_of(model: &Self::Model) -> i32;
}

impl Positioned for block::Entity {
    const SCOPE: &'static str = "page";

    fn id_column() -> block::Column {
        block::Column::Id
    }
    fn scope_column() -> block::Column {
        block::Column::PageId
    }
    fn position_column() -> block::Column {
        block::Column::Position
    }
    fn updated_at_column() -> block::Column {
        block::Column::UpdatedAt
    }

    fn id_of(model: &block::Model) -> i32 {
        model.id
    }
    fn scope_of(model: &block::Model) -> i32 {
        model.page_id
    }
    fn position_of(model: &block::Model) -> i32 {
        model.position
    }
}

impl Positioned for zero_layer::Entity {
    const SCOPE: &'static str = "zero-block";

    fn id_column() -> zero_layer::Column {
        zero_layer::Column::Id
    }
    fn scope_column() -> zero_layer::Column {
        zero_layer::Column::ZeroBlockId
    }
    fn position_column() -> zero_layer::Column {
        zero_layer::Column::Position
    }
    fn updated_at_column() -> zero_layer::Column {
        zero_layer::Column::UpdatedAt
    }

    fn id_of(model: &zero_layer::Model) -> i32 {
        model.id
    }
    fn scope_of(model: &zero_layer::Model) -> i32 {
        model.zero_block_id
    }
    fn position_of(model: &zero_layer::Model) -> i32 {
        model.position
    }
}

/// How a move onto a new position treats the current occupant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStrategy {
    /// Exchange positions with the occupant
    Swap,
    /// Overwrite the position and ignore any occupant
    DirectOverwrite,
}

/// Result of a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Target equals the current position, nothing was written
    Unchanged,
    /// The row now holds the target position; no other row was touched
    Moved,
    /// The row took the target position and `displaced_id` took its old one
    Swapped { displaced_id: i32 },
}

/// Find the sibling occupying `position` in `scope_id`, optionally ignoring one row
pub async fn occupant<E, C>(
    db: &C,
    scope_id: i32,
    position: i32,
    exclude_id: Option<i32>,
) -> std::result::Result<Option<E::Model>, DbErr>
where
    E: Positioned,
    C: ConnectionTrait,
{
    let mut query = E::find()
        .filter(E::scope_column().eq(scope_id))
        .filter(E::position_column().eq(position));

    if let Some(id) = exclude_id {
        query = query.filter(E::id_column().ne(id));
    }

    query.one(db).await
}

/// Fail with `PositionConflict` if `position` is taken in `scope_id`
pub async fn ensure_free<E, C>(
    db: &C,
    scope_id: i32,
    position: i32,
    exclude_id: Option<i32>,
) -> Result<()>
where
    E: Positioned,
    C: ConnectionTrait,
{
    if let Some(existing) = occupant::<E, C>(db, scope_id, position, exclude_id).await? {
        tracing::debug!(
            "Position {} in {} {} already held by {}",
            position,
            E::SCOPE,
            scope_id,
            E::id_of(&existing)
        );
        return Err(ServerError::PositionConflict {
            scope: E::SCOPE,
            scope_id,
            position,
        });
    }
    Ok(())
}

/// Close the gap left by a row deleted at `deleted_position`.
///
/// Returns the number of siblings that were shifted down.
pub async fn compact_shift<E, C>(
    db: &C,
    scope_id: i32,
    deleted_position: i32,
) -> std::result::Result<u64, DbErr>
where
    E: Positioned,
    C: ConnectionTrait,
{
    let result = E::update_many()
        .col_expr(
            E::position_column(),
            Expr::col(E::position_column()).sub(1),
        )
        .col_expr(E::updated_at_column(), Expr::value(unix_now()))
        .filter(E::scope_column().eq(scope_id))
        .filter(E::position_column().gt(deleted_position))
        .exec(db)
        .await?;

    tracing::debug!(
        "Compacted {} {} siblings above position {} in {} {}",
        result.rows_affected,
        E::SCOPE,
        deleted_position,
        E::SCOPE,
        scope_id
    );
    Ok(result.rows_affected)
}

/// Overwrite the stored position of one row. No collision check, no sibling
/// renumbering.
///
/// When `scope_id` is given the write only applies if the row belongs to that
/// scope; the return value tells whether a row was updated.
pub async fn direct_overwrite<E, C>(
    db: &C,
    id: i32,
    scope_id: Option<i32>,
    position: i32,
) -> std::result::Result<bool, DbErr>
where
    E: Positioned,
    C: ConnectionTrait,
{
    let mut update = E::update_many()
        .col_expr(E::position_column(), Expr::value(position))
        .col_expr(E::updated_at_column(), Expr::value(unix_now()))
        .filter(E::id_column().eq(id));

    if let Some(scope_id) = scope_id {
        update = update.filter(E::scope_column().eq(scope_id));
    }

    let result = update.exec(db).await?;
    Ok(result.rows_affected > 0)
}

/// Move `model` to `new_position`, exchanging positions with the current
/// occupant if there is one.
///
/// Both rows are rewritten by a single `UPDATE ... SET position = CASE ...`
/// statement, so there is no intermediate state in which the two rows share a
/// position or one of them holds a placeholder value.
pub async fn swap<E, C>(db: &C, model: &E::Model, new_position: i32) -> Result<MoveOutcome>
where
    E: Positioned,
    C: ConnectionTrait,
{
    let id = E::id_of(model);
    let scope_id = E::scope_of(model);
    let old_position = E::position_of(model);

    if old_position == new_position {
        return Ok(MoveOutcome::Unchanged);
    }

    let Some(displaced) = occupant::<E, C>(db, scope_id, new_position, Some(id)).await? else {
        direct_overwrite::<E, C>(db, id, None, new_position).await?;
        tracing::debug!(
            "Moved {} row {} from {} to free position {}",
            E::SCOPE,
            id,
            old_position,
            new_position
        );
        return Ok(MoveOutcome::Moved);
    };

    let displaced_id = E::id_of(&displaced);
    let case = CaseStatement::new()
        .case(E::id_column().eq(id), new_position)
        .finally(old_position);

    E::update_many()
        .col_expr(E::position_column(), case.into())
        .col_expr(E::updated_at_column(), Expr::value(unix_now()))
        .filter(E::id_column().is_in([id, displaced_id]))
        .exec(db)
        .await?;

    tracing::debug!(
        "Swapped {} rows {} ({} -> {}) and {} ({} -> {})",
        E::SCOPE,
        id,
        old_position,
        new_position,
        displaced_id,
        new_position,
        old_position
    );
    Ok(MoveOutcome::Swapped { displaced_id })
}

/// Move `model` to `new_position` using the given strategy
pub async fn move_to<E, C>(
    db: &C,
    strategy: MoveStrategy,
    model: &E::Model,
    new_position: i32,
) -> Result<MoveOutcome>
where
    E: Positioned,
    C: ConnectionTrait,
{
    match strategy {
        MoveStrategy::Swap => swap::<E, C>(db, model, new_position).await,
        MoveStrategy::DirectOverwrite => {
            if E::position_of(model) == new_position {
                return Ok(MoveOutcome::Unchanged);
            }
            direct_overwrite::<E, C>(db, E::id_of(model), None, new_position).await?;
            Ok(MoveOutcome::Moved)
        }
    }
}
