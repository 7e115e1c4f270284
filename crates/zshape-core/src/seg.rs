//! 线段（无宽度）
//!
//! 所有运算都在整数/扩展精度下完成，交点和投影点使用 [`rescale`] 取整。

use crate::math::{
    clamp_coord, isqrt, rescale, squared_distance, wide_delta, Coord, ECoord, Point2I, VectorExt,
    ECOORD_MAX,
};
use serde::{Deserialize, Serialize};

/// 线段：有序端点对 (A, B)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Seg {
    pub a: Point2I,
    pub b: Point2I,
}

impl Seg {
    pub fn new(a: Point2I, b: Point2I) -> Self {
        Self { a, b }
    }

    /// 平方（扩展精度）
    #[inline]
    pub fn square(v: Coord) -> ECoord {
        ECoord::from(v) * ECoord::from(v)
    }

    /// 长度（截断）
    pub fn length(&self) -> Coord {
        wide_delta(&self.b, &self.a).int_len()
    }

    /// 平方长度
    pub fn squared_length(&self) -> ECoord {
        squared_distance(&self.b, &self.a)
    }

    /// 线段上距离 `p` 最近的点
    pub fn nearest_point(&self, p: &Point2I) -> Point2I {
        let d = wide_delta(&self.b, &self.a);
        let l_squared = d.wide_dot(&d);

        if l_squared == 0 {
            return self.a;
        }

        let t = d.wide_dot(&wide_delta(p, &self.a));

        if t < 0 {
            return self.a;
        } else if t > l_squared {
            return self.b;
        }

        let xp = rescale(t, d.x, l_squared);
        let yp = rescale(t, d.y, l_squared);

        Point2I::new(
            clamp_coord(ECoord::from(self.a.x) + xp),
            clamp_coord(ECoord::from(self.a.y) + yp),
        )
    }

    /// 点到线段的平方距离
    pub fn squared_distance(&self, p: &Point2I) -> ECoord {
        squared_distance(&self.nearest_point(p), p)
    }

    /// 点到线段的距离（截断）
    pub fn distance(&self, p: &Point2I) -> Coord {
        isqrt(self.squared_distance(p))
    }

    /// 点是否在线段上（容差 1 个单位）
    pub fn contains(&self, p: &Point2I) -> bool {
        self.squared_distance(p) <= 1
    }

    /// 计算交点
    ///
    /// - `ignore_endpoints`: 两条线段仅在端点处相接时不算相交
    /// - `lines`: 视为无限长直线
    ///
    /// 平行（包括共线）时返回 `None`。
    pub fn intersect(&self, other: &Seg, ignore_endpoints: bool, lines: bool) -> Option<Point2I> {
        let e = wide_delta(&self.b, &self.a);
        let f = wide_delta(&other.b, &other.a);
        let ac = wide_delta(&other.a, &self.a);

        let d = f.wide_cross(&e);
        let p = f.wide_cross(&ac);
        let q = e.wide_cross(&ac);

        if d == 0 {
            return None;
        }

        if !lines && d > 0 && (q < 0 || q > d || p < 0 || p > d) {
            return None;
        }

        if !lines && d < 0 && (q < d || p < d || p > 0 || q > 0) {
            return None;
        }

        if !lines && ignore_endpoints && (q == 0 || q == d) && (p == 0 || p == d) {
            return None;
        }

        let ip = Point2I::new(
            clamp_coord(ECoord::from(other.a.x) + rescale(q, f.x, d)),
            clamp_coord(ECoord::from(other.a.y) + rescale(q, f.y, d)),
        );

        Some(ip)
    }

    /// 视为无限长直线求交点
    pub fn intersect_lines(&self, other: &Seg) -> Option<Point2I> {
        self.intersect(other, false, true)
    }

    /// 两条线段是否相交（共享端点也算相交）
    pub fn intersects(&self, other: &Seg) -> bool {
        if other.a == self.a || other.b == self.a || other.a == self.b || other.b == self.b {
            return true;
        }

        let e = wide_delta(&self.b, &self.a);
        let f = wide_delta(&other.b, &other.a);
        let ac = wide_delta(&other.a, &self.a);

        let d = f.wide_cross(&e);
        let p = f.wide_cross(&ac);
        let q = e.wide_cross(&ac);

        if d == 0 {
            return false;
        }

        if d > 0 && (q < 0 || q > d || p < 0 || p > d) {
            return false;
        }

        if d < 0 && (q < d || p < d || p > 0 || q > 0) {
            return false;
        }

        true
    }

    /// 两条线段之间的平方距离
    pub fn squared_distance_seg(&self, other: &Seg) -> ECoord {
        if self.intersects(other) {
            return 0;
        }

        [
            other.squared_distance(&self.a),
            other.squared_distance(&self.b),
            self.squared_distance(&other.a),
            self.squared_distance(&other.b),
        ]
        .into_iter()
        .min()
        .unwrap_or(ECOORD_MAX)
    }

    /// 两条线段之间的距离（截断）
    pub fn distance_seg(&self, other: &Seg) -> Coord {
        isqrt(self.squared_distance_seg(other))
    }

    /// 本线段上距离 `other` 最近的点
    pub fn nearest_point_seg(&self, other: &Seg) -> Point2I {
        if let Some(p) = self.intersect(other, false, false) {
            return p;
        }

        let on_other_a = other.nearest_point(&self.a);
        let on_other_b = other.nearest_point(&self.b);
        let on_self_a = self.nearest_point(&other.a);
        let on_self_b = self.nearest_point(&other.b);

        let candidates = [
            (self.a, squared_distance(&on_other_a, &self.a)),
            (self.b, squared_distance(&on_other_b, &self.b)),
            (on_self_a, squared_distance(&on_self_a, &other.a)),
            (on_self_b, squared_distance(&on_self_b, &other.b)),
        ];

        let mut best = candidates[0];
        for candidate in &candidates[1..] {
            if candidate.1 < best.1 {
                best = *candidate;
            }
        }
        best.0
    }

    /// 线段间碰撞：真正相交，或距离为零/小于 `clearance` 时返回实际距离
    pub fn collide_seg(&self, other: &Seg, clearance: Coord) -> Option<Coord> {
        if ccw(&self.a, &other.a, &other.b) != ccw(&self.b, &other.a, &other.b)
            && ccw(&self.a, &self.b, &other.a) != ccw(&self.a, &self.b, &other.b)
        {
            return Some(0);
        }

        let dist_sq = [
            self.squared_distance(&other.a),
            self.squared_distance(&other.b),
            other.squared_distance(&self.a),
            other.squared_distance(&self.b),
        ]
        .into_iter()
        .min()
        .unwrap_or(ECOORD_MAX);

        if dist_sq == 0 || dist_sq < Self::square(clearance) {
            Some(isqrt(dist_sq))
        } else {
            None
        }
    }

    /// 两条线段是否在同一直线上
    pub fn collinear(&self, other: &Seg) -> bool {
        let qa = i128::from(self.a.y) - i128::from(self.b.y);
        let qb = i128::from(self.b.x) - i128::from(self.a.x);
        let qc = -qa * i128::from(self.a.x) - qb * i128::from(self.a.y);

        let side = |p: &Point2I| qa * i128::from(p.x) + qb * i128::from(p.y) + qc;

        side(&other.a) == 0 && side(&other.b) == 0
    }
}

#[inline]
fn ccw(a: &Point2I, b: &Point2I, c: &Point2I) -> bool {
    wide_delta(b, a).wide_cross(&wide_delta(c, a)) > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(ax: Coord, ay: Coord, bx: Coord, by: Coord) -> Seg {
        Seg::new(Point2I::new(ax, ay), Point2I::new(bx, by))
    }

    #[test]
    fn test_nearest_point() {
        let s = seg(0, 0, 10, 0);
        assert_eq!(s.nearest_point(&Point2I::new(5, 7)), Point2I::new(5, 0));
        assert_eq!(s.nearest_point(&Point2I::new(-5, 7)), Point2I::new(0, 0));
        assert_eq!(s.nearest_point(&Point2I::new(15, -3)), Point2I::new(10, 0));
        assert_eq!(s.distance(&Point2I::new(5, 7)), 7);

        let degenerate = seg(3, 3, 3, 3);
        assert_eq!(degenerate.nearest_point(&Point2I::new(10, 10)), Point2I::new(3, 3));
    }

    #[test]
    fn test_intersect() {
        let a = seg(0, 0, 10, 10);
        let b = seg(0, 10, 10, 0);
        assert_eq!(a.intersect(&b, false, false), Some(Point2I::new(5, 5)));
        assert!(a.intersects(&b));

        let c = seg(20, 0, 30, 0);
        assert_eq!(a.intersect(&c, false, false), None);
        assert_eq!(a.intersect_lines(&c), Some(Point2I::new(0, 0)));

        // 平行线没有交点
        assert_eq!(seg(0, 0, 10, 0).intersect_lines(&seg(0, 5, 10, 5)), None);
    }

    #[test]
    fn test_intersect_ignore_endpoints() {
        let a = seg(0, 0, 10, 0);
        let b = seg(10, 0, 10, 10);
        assert!(a.intersect(&b, false, false).is_some());
        assert!(a.intersect(&b, true, false).is_none());
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_segment_distance() {
        let a = seg(0, 0, 10, 0);
        let b = seg(0, 5, 10, 5);
        assert_eq!(a.squared_distance_seg(&b), 25);
        assert_eq!(a.distance_seg(&b), 5);
        assert_eq!(a.nearest_point_seg(&seg(20, 3, 30, 3)), Point2I::new(10, 0));

        // 共线重叠
        assert_eq!(a.squared_distance_seg(&seg(5, 0, 15, 0)), 0);
    }

    #[test]
    fn test_collide_seg() {
        let a = seg(0, 0, 10, 0);
        assert_eq!(a.collide_seg(&seg(5, -5, 5, 5), 0), Some(0));
        assert_eq!(a.collide_seg(&seg(0, 5, 10, 5), 6), Some(5));
        assert_eq!(a.collide_seg(&seg(0, 5, 10, 5), 5), None);
    }

    #[test]
    fn test_collinear() {
        assert!(seg(0, 0, 10, 10).collinear(&seg(20, 20, -5, -5)));
        assert!(!seg(0, 0, 10, 10).collinear(&seg(20, 21, -5, -5)));
    }

    #[test]
    fn test_far_apart_coordinates() {
        const FAR: Coord = 2_000_000_000;

        let long = seg(-FAR, 0, FAR, 0);
        assert_eq!(long.nearest_point(&Point2I::new(1_000_000_000, 7)), Point2I::new(1_000_000_000, 0));
        assert_eq!(long.distance(&Point2I::new(0, -FAR)), FAR);
        assert_eq!(long.length(), Coord::MAX);

        let cross = seg(0, -FAR, 0, FAR);
        assert_eq!(long.intersect(&cross, false, false), Some(Point2I::new(0, 0)));
        assert_eq!(long.collide_seg(&cross, 0), Some(0));

        let diagonal = seg(-FAR, -FAR, FAR, FAR);
        assert!(diagonal.collinear(&seg(-1, -1, 5, 5)));
        assert_eq!(diagonal.intersect_lines(&seg(-FAR, FAR, FAR, -FAR)), Some(Point2I::new(0, 0)));

        // 相距超出 ECoord 平方范围时饱和，但不会相交
        let far_away = seg(-FAR, -FAR, -FAR, -FAR + 1);
        assert_eq!(far_away.squared_distance_seg(&seg(FAR, FAR, FAR, FAR)), ECOORD_MAX);
    }
}
