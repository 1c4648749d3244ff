//! Surface materials and pairwise contact overrides.
//!
//! Colliders carry their [`SurfaceMaterial`] in rapier's `user_data`. The
//! [`MaterialTable`] is passed to the physics pipeline as its hooks object and
//! rewrites friction/restitution on solver contacts whose material pair has a
//! configured rule.

use rapier3d::prelude::*;

use crate::config::{ContactRuleConfig, PhysicsConfig};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SurfaceMaterial {
    #[default]
    Default,
    Ground,
    Wheel,
}

impl SurfaceMaterial {
    #[inline]
    pub fn user_data(self) -> u128 {
        match self {
            Self::Default => 0,
            Self::Ground => 1,
            Self::Wheel => 2,
        }
    }

    /// Unknown tags read back as `Default`.
    #[inline]
    pub fn from_user_data(data: u128) -> Self {
        match data {
            1 => Self::Ground,
            2 => Self::Wheel,
            _ => Self::Default,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MaterialTable {
    rules: Vec<(SurfaceMaterial, SurfaceMaterial, ContactRuleConfig)>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &PhysicsConfig) -> Self {
        let mut table = Self::new();
        table.set_rule(SurfaceMaterial::Wheel, SurfaceMaterial::Ground, cfg.wheel_ground);
        table
    }

    /// Insert or replace the rule for an unordered pair.
    pub fn set_rule(&mut self, a: SurfaceMaterial, b: SurfaceMaterial, rule: ContactRuleConfig) {
        match self.rules.iter_mut().find(|(x, y, _)| same_pair((*x, *y), (a, b))) {
            Some(entry) => entry.2 = rule,
            None => self.rules.push((a, b, rule)),
        }
    }

    pub fn rule(&self, a: SurfaceMaterial, b: SurfaceMaterial) -> Option<ContactRuleConfig> {
        self.rules
            .iter()
            .find(|(x, y, _)| same_pair((*x, *y), (a, b)))
            .map(|(_, _, rule)| *rule)
    }
}

#[inline]
fn same_pair(p: (SurfaceMaterial, SurfaceMaterial), q: (SurfaceMaterial, SurfaceMaterial)) -> bool {
    p == q || (p.0 == q.1 && p.1 == q.0)
}

impl PhysicsHooks for MaterialTable {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let material = |h: ColliderHandle| {
            context
                .colliders
                .get(h)
                .map(|c| SurfaceMaterial::from_user_data(c.user_data))
                .unwrap_or_default()
        };
        let (a, b) = (material(context.collider1), material(context.collider2));

        if let Some(rule) = self.rule(a, b) {
            for contact in context.solver_contacts.iter_mut() {
                contact.friction = rule.friction;
                contact.restitution = rule.restitution;
            }
        }
    }
}
