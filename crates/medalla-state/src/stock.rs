//! # Keg Stock
//!
//! Stock moves in three ways:
//!
//! - [`reserve`] takes kegs for a new rental. It checks every line first,
//!   aggregating repeated kegs, and only then decrements. Either every line
//!   is applied or none is.
//! - [`release`] puts a reservation back, e.g. when the rental could not be
//!   stored.
//! - [`apply_effect`] moves stock for a status change: kegs come back when a
//!   rental is returned and go out again when a return is reverted. The
//!   withdrawal does not check availability; the kegs were already counted as
//!   rented before the return was recorded, so stock may go negative and
//!   callers should warn.
//!
//! No stock count may leave `-MAX_STOCK..=MAX_STOCK`. A movement that would
//! is rejected with [`StockError::Overflow`] before anything changes.
//!
//! The functions operate on any keyed collection of [`StockHolder`]s so the
//! caller decides which lock protects it.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::rental::StockEffect;

/// Largest stock count a keg may hold.
pub const MAX_STOCK: i64 = i32::MAX as i64;

/// Anything that carries a stock count.
pub trait StockHolder {
    fn stock(&self) -> i64;
    fn set_stock(&mut self, stock: i64);
    /// Human label used in error messages (the keg size).
    fn label(&self) -> &str;
}

/// One line of a rental order as seen by stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLine {
    pub keg_id: Uuid,
    pub quantity: u32,
}

/// Before/after of one keg touched by a stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockAdjustment {
    pub keg_id: Uuid,
    pub before: i64,
    pub after: i64,
}

impl StockAdjustment {
    pub fn delta(&self) -> i64 {
        self.after - self.before
    }

    pub fn went_negative(&self) -> bool {
        self.after < 0
    }
}

/// Result of an unguarded movement: what changed and which kegs were gone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockMovement {
    pub adjustments: Vec<StockAdjustment>,
    pub missing: Vec<Uuid>,
}

impl StockMovement {
    pub fn is_empty(&self) -> bool {
        self.adjustments.is_empty() && self.missing.is_empty()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StockError {
    #[error("keg {keg_id} not found")]
    KegNotFound { keg_id: Uuid },

    #[error("insufficient stock for keg {label}: requested {requested}, available {available}")]
    Insufficient {
        keg_id: Uuid,
        label: String,
        requested: i64,
        available: i64,
    },

    #[error("stock for keg {label} would leave the allowed range")]
    Overflow { keg_id: Uuid, label: String },
}

/// Total quantity requested per keg, in a stable order.
pub fn demand(lines: &[StockLine]) -> BTreeMap<Uuid, i64> {
    let mut totals = BTreeMap::new();
    for line in lines {
        *totals.entry(line.keg_id).or_insert(0) += i64::from(line.quantity);
    }
    totals
}

/// Check and take stock for every line, or leave the collection untouched.
pub fn reserve<K: StockHolder>(
    kegs: &mut HashMap<Uuid, K>,
    lines: &[StockLine],
) -> Result<Vec<StockAdjustment>, StockError> {
    let totals = demand(lines);

    for (keg_id, requested) in &totals {
        let keg = kegs
            .get(keg_id)
            .ok_or(StockError::KegNotFound { keg_id: *keg_id })?;
        if keg.stock() < *requested {
            return Err(StockError::Insufficient {
                keg_id: *keg_id,
                label: keg.label().to_string(),
                requested: *requested,
                available: keg.stock(),
            });
        }
    }

    let moves: Vec<(Uuid, i64)> = totals.into_iter().map(|(id, q)| (id, -q)).collect();
    commit(kegs, &moves)
}

/// Put a reservation back. Errors only when a keg would overflow, in which
/// case nothing is changed.
pub fn release<K: StockHolder>(
    kegs: &mut HashMap<Uuid, K>,
    lines: &[StockLine],
) -> Result<StockMovement, StockError> {
    apply_effect(kegs, lines, StockEffect::Restore)
}

/// Apply a status change's stock effect. Kegs that no longer exist are
/// reported in [`StockMovement::missing`] and skipped.
pub fn apply_effect<K: StockHolder>(
    kegs: &mut HashMap<Uuid, K>,
    lines: &[StockLine],
    effect: StockEffect,
) -> Result<StockMovement, StockError> {
    let mut movement = StockMovement::default();
    if effect == StockEffect::None {
        return Ok(movement);
    }
    let mut moves = Vec::new();
    for (keg_id, quantity) in demand(lines) {
        if kegs.contains_key(&keg_id) {
            moves.push((keg_id, effect.sign() * quantity));
        } else {
            movement.missing.push(keg_id);
        }
    }
    movement.adjustments = commit(kegs, &moves)?;
    Ok(movement)
}

/// Check every move against the stock range, then apply them all.
fn commit<K: StockHolder>(
    kegs: &mut HashMap<Uuid, K>,
    moves: &[(Uuid, i64)],
) -> Result<Vec<StockAdjustment>, StockError> {
    let mut planned = Vec::with_capacity(moves.len());
    for (keg_id, delta) in moves {
        let Some(keg) = kegs.get(keg_id) else {
            continue;
        };
        let before = keg.stock();
        let after = before
            .checked_add(*delta)
            .filter(|n| (-MAX_STOCK..=MAX_STOCK).contains(n))
            .ok_or_else(|| StockError::Overflow {
                keg_id: *keg_id,
                label: keg.label().to_string(),
            })?;
        planned.push(StockAdjustment {
            keg_id: *keg_id,
            before,
            after,
        });
    }
    for adjustment in &planned {
        if let Some(keg) = kegs.get_mut(&adjustment.keg_id) {
            keg.set_stock(adjustment.after);
        }
    }
    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Keg {
        size: String,
        stock: i64,
    }

    impl StockHolder for Keg {
        fn stock(&self) -> i64 {
            self.stock
        }
        fn set_stock(&mut self, stock: i64) {
            self.stock = stock;
        }
        fn label(&self) -> &str {
            &self.size
        }
    }

    fn warehouse(stocks: &[(&str, i64)]) -> (HashMap<Uuid, Keg>, Vec<Uuid>) {
        let mut kegs = HashMap::new();
        let mut ids = Vec::new();
        for (size, stock) in stocks {
            let id = Uuid::new_v4();
            kegs.insert(
                id,
                Keg {
                    size: size.to_string(),
                    stock: *stock,
                },
            );
            ids.push(id);
        }
        (kegs, ids)
    }

    fn line(keg_id: Uuid, quantity: u32) -> StockLine {
        StockLine { keg_id, quantity }
    }

    #[test]
    fn reserve_decrements_each_keg() {
        let (mut kegs, ids) = warehouse(&[("20 Litros", 50), ("50 Litros", 20)]);
        let adj = reserve(&mut kegs, &[line(ids[0], 3), line(ids[1], 1)]).unwrap();
        assert_eq!(adj.len(), 2);
        assert_eq!(kegs[&ids[0]].stock, 47);
        assert_eq!(kegs[&ids[1]].stock, 19);
    }

    #[test]
    fn reserve_aggregates_repeated_kegs() {
        let (mut kegs, ids) = warehouse(&[("30 Litros", 5)]);
        let err = reserve(&mut kegs, &[line(ids[0], 3), line(ids[0], 3)]).unwrap_err();
        assert_eq!(
            err,
            StockError::Insufficient {
                keg_id: ids[0],
                label: "30 Litros".into(),
                requested: 6,
                available: 5,
            }
        );
        assert_eq!(kegs[&ids[0]].stock, 5);
    }

    #[test]
    fn reserve_is_all_or_nothing() {
        let (mut kegs, ids) = warehouse(&[("10 Litros", 100), ("50 Litros", 1)]);
        let before = kegs.clone();
        let result = reserve(&mut kegs, &[line(ids[0], 10), line(ids[1], 2)]);
        assert!(result.is_err());
        assert_eq!(kegs, before);
    }

    #[test]
    fn reserve_unknown_keg() {
        let (mut kegs, _) = warehouse(&[("10 Litros", 100)]);
        let ghost = Uuid::new_v4();
        assert_eq!(
            reserve(&mut kegs, &[line(ghost, 1)]).unwrap_err(),
            StockError::KegNotFound { keg_id: ghost }
        );
    }

    #[test]
    fn reserve_exact_stock_reaches_zero() {
        let (mut kegs, ids) = warehouse(&[("50 Litros", 2)]);
        reserve(&mut kegs, &[line(ids[0], 2)]).unwrap();
        assert_eq!(kegs[&ids[0]].stock, 0);
    }

    #[test]
    fn withdraw_may_go_negative() {
        let (mut kegs, ids) = warehouse(&[("20 Litros", 1)]);
        let movement = apply_effect(&mut kegs, &[line(ids[0], 3)], StockEffect::Withdraw).unwrap();
        assert_eq!(kegs[&ids[0]].stock, -2);
        assert!(movement.adjustments[0].went_negative());
        assert_eq!(movement.adjustments[0].delta(), -3);
    }

    #[test]
    fn release_reports_missing_kegs() {
        let (mut kegs, ids) = warehouse(&[("20 Litros", 0)]);
        let ghost = Uuid::new_v4();
        let movement = release(&mut kegs, &[line(ids[0], 2), line(ghost, 1)]).unwrap();
        assert_eq!(kegs[&ids[0]].stock, 2);
        assert_eq!(movement.missing, vec![ghost]);
    }

    #[test]
    fn no_effect_touches_nothing() {
        let (mut kegs, ids) = warehouse(&[("20 Litros", 4)]);
        let movement = apply_effect(&mut kegs, &[line(ids[0], 2)], StockEffect::None).unwrap();
        assert!(movement.is_empty());
        assert_eq!(kegs[&ids[0]].stock, 4);
    }

    #[test]
    fn deltas_replay_in_any_order() {
        let (mut kegs, ids) = warehouse(&[("20 Litros", 10)]);
        let first = reserve(&mut kegs, &[line(ids[0], 2)]).unwrap();
        let second = reserve(&mut kegs, &[line(ids[0], 2)]).unwrap();
        assert_eq!(kegs[&ids[0]].stock, 6);
        // Replayed newest first, the deltas still land on the live count;
        // the older absolute value would not.
        assert_eq!(10 + second[0].delta() + first[0].delta(), 6);
        assert_eq!(first[0].after, 8);
    }

    #[test]
    fn restore_past_the_ceiling_is_rejected_untouched() {
        let (mut kegs, ids) = warehouse(&[("10 Litros", 4), ("50 Litros", MAX_STOCK)]);
        let before = kegs.clone();
        let err = apply_effect(
            &mut kegs,
            &[line(ids[0], 1), line(ids[1], 1)],
            StockEffect::Restore,
        )
        .unwrap_err();
        assert_eq!(
            err,
            StockError::Overflow {
                keg_id: ids[1],
                label: "50 Litros".into(),
            }
        );
        assert_eq!(kegs, before);
    }

    #[test]
    fn restore_near_i64_max_does_not_panic() {
        let (mut kegs, ids) = warehouse(&[("20 Litros", i64::MAX)]);
        let result = apply_effect(&mut kegs, &[line(ids[0], 1)], StockEffect::Restore);
        assert!(matches!(result, Err(StockError::Overflow { .. })));
        assert_eq!(kegs[&ids[0]].stock, i64::MAX);
    }

    #[test]
    fn withdraw_below_the_floor_is_rejected() {
        let (mut kegs, ids) = warehouse(&[("20 Litros", -MAX_STOCK)]);
        let result = apply_effect(&mut kegs, &[line(ids[0], 1)], StockEffect::Withdraw);
        assert!(matches!(result, Err(StockError::Overflow { .. })));
        assert_eq!(kegs[&ids[0]].stock, -MAX_STOCK);
    }

    proptest! {
        #[test]
        fn reserve_then_release_restores_stock(
            stocks in proptest::collection::vec(0i64..200, 1..5),
            picks in proptest::collection::vec((0usize..5, 1u32..20), 1..8),
        ) {
            let sizes: Vec<(String, i64)> = stocks
                .iter()
                .enumerate()
                .map(|(i, s)| (format!("{i} Litros"), *s))
                .collect();
            let refs: Vec<(&str, i64)> = sizes.iter().map(|(n, s)| (n.as_str(), *s)).collect();
            let (mut kegs, ids) = warehouse(&refs);
            let lines: Vec<StockLine> = picks
                .iter()
                .map(|(i, q)| line(ids[i % ids.len()], *q))
                .collect();
            let original = kegs.clone();

            match reserve(&mut kegs, &lines) {
                Ok(adjustments) => {
                    let taken: i64 = adjustments.iter().map(|a| -a.delta()).sum();
                    let asked: i64 = lines.iter().map(|l| i64::from(l.quantity)).sum();
                    prop_assert_eq!(taken, asked);
                    prop_assert!(kegs.values().all(|k| k.stock >= 0));
                    release(&mut kegs, &lines).unwrap();
                    prop_assert_eq!(kegs, original);
                }
                Err(_) => prop_assert_eq!(kegs, original),
            }
        }
    }
}
