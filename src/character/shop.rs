//! Shops: tile rectangles owned by a shopkeeper. Items dropped inside are
//! sold to the keeper; picking them up again costs their price.

use bevy::math::{Vec2, Vec3};

use super::ChrRef;
use crate::mesh::Mesh;
use crate::simulation::{SimEvent, Simulation};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shop {
    pub owner: ChrRef,
    /// Inclusive tile corners
    pub min_grid: (i32, i32),
    pub max_grid: (i32, i32),
}

impl Shop {
    pub fn contains(&self, pos: Vec2) -> bool {
        let (gx, gy) = Mesh::tile_coords(pos);
        (self.min_grid.0..=self.max_grid.0).contains(&gx)
            && (self.min_grid.1..=self.max_grid.1).contains(&gy)
    }
}

impl Simulation {
    pub fn add_shop(&mut self, owner: ChrRef, min_grid: (i32, i32), max_grid: (i32, i32)) {
        self.shops.push(Shop {
            owner,
            min_grid: (min_grid.0.min(max_grid.0), min_grid.1.min(max_grid.1)),
            max_grid: (min_grid.0.max(max_grid.0), min_grid.1.max(max_grid.1)),
        });
    }

    /// Shop under `pos` whose keeper is still alive.
    pub fn shop_at(&self, pos: Vec3) -> Option<&Shop> {
        self.shops.iter().find(|s| {
            s.contains(pos.truncate()) && self.chars.get(s.owner).is_some_and(|o| o.alive)
        })
    }

    fn item_price(&self, item: ChrRef) -> u16 {
        let Some(it) = self.chars.get(item) else {
            return 0;
        };
        let Some(p) = self.profiles.get(it.profile) else {
            return 0;
        };
        if p.is_stackable {
            p.price.saturating_mul(it.ammo.max(1))
        } else {
            p.price
        }
    }

    /// Sell a just-dropped item to the keeper of the shop it landed in.
    pub(crate) fn sell_if_in_shop(&mut self, seller: ChrRef, item: ChrRef) -> bool {
        let Some(it) = self.chars.get(item) else {
            return false;
        };
        let (pos, kursed, already) = (it.pos, it.is_kursed, it.shop_owned);
        let Some(owner) = self.shop_at(pos).map(|s| s.owner) else {
            return false;
        };
        if owner == seller || already {
            return false;
        }
        if kursed {
            self.events.push(SimEvent::Billboard {
                chr: seller,
                text: "The shopkeeper won't touch it".into(),
            });
            return false;
        }

        let price = self.item_price(item);
        if let Some(s) = self.chars.get_mut(seller) {
            s.money = s.money.saturating_add(price);
        }
        if let Some(o) = self.chars.get_mut(owner) {
            o.money = o.money.saturating_sub(price);
        }
        if let Some(it) = self.chars.get_mut(item) {
            it.shop_owned = true;
        }
        self.events.push(SimEvent::Billboard {
            chr: seller,
            text: format!("Sold for {price}"),
        });
        tracing::debug!(?seller, ?item, price, "sold");
        true
    }

    /// Pay for a shop-owned item. Outside any living keeper's shop the item
    /// is simply free to take.
    pub(crate) fn buy_if_in_shop(&mut self, buyer: ChrRef, item: ChrRef) -> bool {
        let Some(it) = self.chars.get(item) else {
            return false;
        };
        if !it.shop_owned {
            return true;
        }
        let pos = it.pos;
        let Some(owner) = self.shop_at(pos).map(|s| s.owner) else {
            if let Some(it) = self.chars.get_mut(item) {
                it.shop_owned = false;
            }
            return true;
        };

        let price = self.item_price(item);
        let funds = self.chars.get(buyer).map_or(0, |b| b.money);
        if owner != buyer && funds < price {
            self.events.push(SimEvent::Billboard {
                chr: buyer,
                text: format!("Costs {price}"),
            });
            return false;
        }
        if owner != buyer {
            if let Some(b) = self.chars.get_mut(buyer) {
                b.money -= price;
            }
            if let Some(o) = self.chars.get_mut(owner) {
                o.money = o.money.saturating_add(price);
            }
        }
        if let Some(it) = self.chars.get_mut(item) {
            it.shop_owned = false;
        }
        self.events.push(SimEvent::Billboard {
            chr: buyer,
            text: format!("Bought for {price}"),
        });
        tracing::debug!(?buyer, ?item, price, "bought");
        true
    }
}
