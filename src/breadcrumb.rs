//! Breadcrumb trail of recent safe positions.
//!
//! Each character keeps a small ring of positions where it stood clear of
//! walls. When the wall push-out cannot find a direction, the newest valid
//! crumb is consumed as a teleport destination.

use bevy::math::Vec3;
use std::collections::VecDeque;

use crate::constants::BREADCRUMB_CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breadcrumb {
    pub pos: Vec3,
    pub grid: Option<usize>,
    pub tick: u64,
    pub valid: bool,
    pub id: u32,
}

/// Bounded newest-last list of breadcrumbs.
#[derive(Debug, Clone)]
pub struct BreadcrumbRing {
    crumbs: VecDeque<Breadcrumb>,
    capacity: usize,
    next_id: u32,
}

impl Default for BreadcrumbRing {
    fn default() -> Self {
        Self::new(BREADCRUMB_CAPACITY)
    }
}

impl BreadcrumbRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            crumbs: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.crumbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crumbs.is_empty()
    }

    /// Record a safe position, evicting the oldest crumb when full.
    pub fn push(&mut self, pos: Vec3, grid: Option<usize>, tick: u64) {
        if self.crumbs.len() == self.capacity {
            self.crumbs.pop_front();
        }
        self.crumbs.push_back(Breadcrumb {
            pos,
            grid,
            tick,
            valid: true,
            id: self.next_id,
        });
        self.next_id = self.next_id.wrapping_add(1);
    }

    pub fn newest(&self) -> Option<&Breadcrumb> {
        self.crumbs.back()
    }

    /// Newest crumb still marked valid.
    pub fn last_valid(&self) -> Option<&Breadcrumb> {
        self.crumbs.iter().rev().find(|c| c.valid)
    }

    /// Remove and return the newest valid crumb, discarding invalid ones on the way.
    pub fn take_last_valid(&mut self) -> Option<Breadcrumb> {
        while let Some(crumb) = self.crumbs.pop_back() {
            if crumb.valid {
                return Some(crumb);
            }
        }
        None
    }

    /// Mark crumbs failing `still_safe` as invalid.
    pub fn revalidate(&mut self, mut still_safe: impl FnMut(&Breadcrumb) -> bool) {
        for crumb in self.crumbs.iter_mut() {
            if crumb.valid && !still_safe(crumb) {
                crumb.valid = false;
            }
        }
    }

    pub fn clear(&mut self) {
        self.crumbs.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Breadcrumb> {
        self.crumbs.iter()
    }
}
