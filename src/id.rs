// Copyright 2016 The Cartographer Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::cmp::Ordering;
use std::fmt;

/// An arbitrary-precision non-negative integer, used as a node or chunk
/// address. Octree node indices grow by `dimensions` bits per depth, so a
/// sufficiently deep tree overflows a machine word; `Id` stores its value as
/// little-endian 64-bit limbs and only narrows to `u64` when the caller
/// asserts (via `simple()`) that it is safe to do so.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Id {
    // Little-endian limbs. Invariant: no trailing zero limb except to
    // represent zero itself as `[0]`.
    limbs: Vec<u64>,
}

impl Id {
    pub fn zero() -> Self {
        Id { limbs: vec![0] }
    }

    pub fn from_u64(value: u64) -> Self {
        Id { limbs: vec![value] }
    }

    fn normalize(mut self) -> Self {
        while self.limbs.len() > 1 && *self.limbs.last().unwrap() == 0 {
            self.limbs.pop();
        }
        self
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|&l| l == 0)
    }

    /// Narrows this id to a `u64`. Panics if the value does not fit - the
    /// caller is expected to know, from the tree depth it is operating at,
    /// that this is safe.
    pub fn simple(&self) -> u64 {
        assert!(
            self.limbs.len() == 1,
            "Id does not fit a machine word: {:?}",
            self.limbs
        );
        self.limbs[0]
    }

    pub fn fits_u64(&self) -> bool {
        self.limbs.len() == 1
    }

    /// Like `simple()`, but saturates to `u64::MAX` instead of panicking.
    /// Used only where an overflowing id needs to be reported (e.g. in an
    /// error message) rather than operated on.
    pub fn to_u64_saturating(&self) -> u64 {
        if self.fits_u64() {
            self.limbs[0]
        } else {
            u64::max_value()
        }
    }

    /// `self << bits`, bits must be less than 64 (we only ever shift by
    /// `dimensions`, which is 2 or 3).
    pub fn shl(&self, bits: u32) -> Self {
        assert!(bits < 64);
        if bits == 0 {
            return self.clone();
        }
        let mut out = vec![0u64; self.limbs.len() + 1];
        for (i, &limb) in self.limbs.iter().enumerate() {
            let hi = limb >> (64 - bits);
            let lo = limb << bits;
            out[i] |= lo;
            out[i + 1] |= hi;
        }
        Id { limbs: out }.normalize()
    }

    pub fn shr(&self, bits: u32) -> Self {
        assert!(bits < 64);
        if bits == 0 {
            return self.clone();
        }
        let mut out = vec![0u64; self.limbs.len()];
        for i in 0..self.limbs.len() {
            let lo = self.limbs[i] >> bits;
            let hi = if i + 1 < self.limbs.len() && bits > 0 {
                self.limbs[i + 1] << (64 - bits)
            } else {
                0
            };
            out[i] = lo | hi;
        }
        Id { limbs: out }.normalize()
    }

    pub fn add_u64(&self, rhs: u64) -> Self {
        self.add(&Id::from_u64(rhs))
    }

    pub fn add(&self, rhs: &Id) -> Self {
        let len = self.limbs.len().max(rhs.limbs.len()) + 1;
        let mut out = vec![0u64; len];
        let mut carry = 0u128;
        for i in 0..len {
            let a = *self.limbs.get(i).unwrap_or(&0) as u128;
            let b = *rhs.limbs.get(i).unwrap_or(&0) as u128;
            let sum = a + b + carry;
            out[i] = sum as u64;
            carry = sum >> 64;
        }
        Id { limbs: out }.normalize()
    }

    /// `self - rhs`. Only valid when `self >= rhs`; the spec's invariant
    /// places this obligation on the caller.
    pub fn sub(&self, rhs: &Id) -> Self {
        assert!(
            self >= rhs,
            "Id::sub called with a - b where a < b (a={:?}, b={:?})",
            self.limbs,
            rhs.limbs
        );
        let mut out = vec![0u64; self.limbs.len()];
        let mut borrow = 0i128;
        for i in 0..self.limbs.len() {
            let a = self.limbs[i] as i128;
            let b = *rhs.limbs.get(i).unwrap_or(&0) as i128;
            let mut diff = a - b - borrow;
            if diff < 0 {
                diff += 1i128 << 64;
                borrow = 1;
            } else {
                borrow = 0;
            }
            out[i] = diff as u64;
        }
        Id { limbs: out }.normalize()
    }

    pub fn sub_u64(&self, rhs: u64) -> Self {
        self.sub(&Id::from_u64(rhs))
    }
}

impl Ord for Id {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.limbs.len().max(other.limbs.len());
        for i in (0..len).rev() {
            let a = *self.limbs.get(i).unwrap_or(&0);
            let b = *other.limbs.get(i).unwrap_or(&0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Id {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.fits_u64() {
            write!(f, "Id({})", self.limbs[0])
        } else {
            write!(f, "Id({:?})", self.limbs)
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Decimal formatting via repeated division; ids are small enough in
        // practice (a handful of limbs at most) that this is never hot.
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut digits = Vec::new();
        let mut limbs = self.limbs.clone();
        while !limbs.iter().all(|&l| l == 0) {
            let mut remainder: u128 = 0;
            for limb in limbs.iter_mut().rev() {
                let acc = (remainder << 64) | *limb as u128;
                *limb = (acc / 10) as u64;
                remainder = acc % 10;
            }
            digits.push((remainder as u8 + b'0') as char);
        }
        let s: String = digits.into_iter().rev().collect();
        write!(f, "{}", s)
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Id::from_u64(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_round_trip() {
        let id = Id::from_u64(42);
        assert_eq!(42, id.simple());
    }

    #[test]
    #[should_panic]
    fn simple_panics_when_too_large() {
        let id = Id::from_u64(u64::max_value()).shl(3);
        id.simple();
    }

    #[test]
    fn shift_add_sub_round_trip() {
        let a = Id::from_u64(5);
        let shifted = a.shl(3).add_u64(1 + 2); // index = (parent << dims) | (1 + octant)
        assert_eq!(43, shifted.simple());
        assert_eq!(5, shifted.sub_u64(3).shr(3).simple());
    }

    #[test]
    fn ordering_across_limb_boundary() {
        let small = Id::from_u64(u64::max_value());
        let big = small.add_u64(1);
        assert!(big > small);
        assert!(!big.fits_u64());
        assert_eq!(small, big.sub_u64(1));
    }

    #[test]
    fn display_matches_decimal() {
        assert_eq!("0", Id::zero().to_string());
        assert_eq!("1024", Id::from_u64(1024).to_string());
        let big = Id::from_u64(u64::max_value()).add_u64(1);
        assert_eq!("18446744073709551616", big.to_string());
    }

    #[test]
    fn geometric_sum_offset_matches_index_composition() {
        // index = sum(dir_k * factor^k) + (factor^d - 1)/(factor - 1), where
        // dir_k is the octant chosen `k` climbs before the last one (so the
        // most recent climb contributes the factor^0 term).
        let factor = 8u64;
        let mut id = Id::zero();
        let dirs = [1u64, 0, 3, 2];
        for &dir in &dirs {
            id = id.shl(3).add_u64(1 + dir);
        }
        let mut expected = 0u64;
        let mut offset = 0u64;
        for (k, &dir) in dirs.iter().rev().enumerate() {
            expected += dir * factor.pow(k as u32);
            offset += factor.pow(k as u32);
        }
        assert_eq!(expected + offset, id.simple());
    }
}
