use hourglass_rs::SafeTimeProvider;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::model::SpendingGoal;
use crate::store::MemoryStore;
use crate::types::{Category, GoalId, GoalPeriod, UserId};

/// parameters for setting a spending ceiling
#[derive(Debug, Clone)]
pub struct NewGoal {
    pub category: Category,
    pub amount_limit: Money,
    pub period: GoalPeriod,
}

/// a goal evaluated against spending in the current period window
#[derive(Debug, Clone, PartialEq)]
pub struct GoalEvaluation {
    pub goal: SpendingGoal,
    pub amount_spent: Money,
    pub percentage_used: Decimal,
    pub warning: bool,
}

/// spent fraction at which a goal starts warning
const WARNING_THRESHOLD: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

/// per-category spending ceilings over rolling calendar windows
///
/// At most one goal exists per (user, category, period); setting it again
/// replaces the limit. Evaluation measures expense transactions from the
/// start of the current window through now.
pub struct SpendingGoalEngine;

impl SpendingGoalEngine {
    /// create the goal, or update the limit when one already exists for the
    /// same category and period
    pub fn set_goal(
        store: &mut MemoryStore,
        user_id: UserId,
        req: NewGoal,
        time: &SafeTimeProvider,
    ) -> Result<SpendingGoal> {
        if req.amount_limit.is_negative() {
            return Err(LedgerError::InvalidAmount {
                amount: req.amount_limit,
            });
        }

        let now = time.now();
        if let Some(existing) = store.find_goal(user_id, req.category, req.period) {
            let id = existing.id;
            let goal = store.goal_mut(id)?;
            goal.amount_limit = req.amount_limit;
            goal.created_at = now;
            debug!(goal = %id, limit = %req.amount_limit, "goal limit replaced");
            return Ok(goal.clone());
        }

        let goal = SpendingGoal {
            id: Uuid::new_v4(),
            user_id,
            category: req.category,
            amount_limit: req.amount_limit,
            period: req.period,
            created_at: now,
        };
        debug!(goal = %goal.id, "goal created");
        Ok(store.insert_goal(goal))
    }

    /// expense total for the goal's category inside the current window
    pub fn amount_spent(
        store: &MemoryStore,
        goal: &SpendingGoal,
        time: &SafeTimeProvider,
    ) -> Money {
        let now = time.now();
        let window_start = goal
            .period
            .window_start(now.date_naive())
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc();
        store.sum_expenses(goal.user_id, goal.category, window_start, now)
    }

    pub fn evaluate(
        store: &MemoryStore,
        user_id: UserId,
        goal_id: GoalId,
        time: &SafeTimeProvider,
    ) -> Result<GoalEvaluation> {
        let goal = Self::owned_goal(store, goal_id, user_id)?.clone();
        Ok(Self::evaluate_goal(store, goal, time))
    }

    /// every goal of the user, each evaluated against its own window
    pub fn list(
        store: &MemoryStore,
        user_id: UserId,
        time: &SafeTimeProvider,
    ) -> Vec<GoalEvaluation> {
        let goals: Vec<SpendingGoal> = store
            .goals_for_user(user_id)
            .into_iter()
            .cloned()
            .collect();
        goals
            .into_iter()
            .map(|goal| Self::evaluate_goal(store, goal, time))
            .collect()
    }

    pub fn delete(store: &mut MemoryStore, user_id: UserId, goal_id: GoalId) -> Result<()> {
        Self::owned_goal(store, goal_id, user_id)?;
        store.remove_goal(goal_id);
        Ok(())
    }

    fn evaluate_goal(
        store: &MemoryStore,
        goal: SpendingGoal,
        time: &SafeTimeProvider,
    ) -> GoalEvaluation {
        let spent = Self::amount_spent(store, &goal, time);
        // a zero limit reports zero usage rather than dividing by zero
        let percentage_used = if goal.amount_limit.is_zero() {
            Decimal::ZERO
        } else {
            (spent.as_decimal() / goal.amount_limit.as_decimal() * Decimal::from(100))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        };
        GoalEvaluation {
            warning: percentage_used >= WARNING_THRESHOLD,
            goal,
            amount_spent: spent,
            percentage_used,
        }
    }

    fn owned_goal(store: &MemoryStore, goal_id: GoalId, user_id: UserId) -> Result<&SpendingGoal> {
        let goal = store.goal(goal_id)?;
        if goal.user_id != user_id {
            return Err(LedgerError::Forbidden {
                resource: "spending goal",
                id: goal_id,
            });
        }
        Ok(goal)
    }
}
