//! 折线（开放/闭合）与简单多边形
//!
//! [`LineChainBase`] 是所有"由线段组成"的图元的公共能力：
//! 线段枚举、点包含测试以及与单条线段的碰撞。

use crate::collision::{Collision, Request};
use crate::math::{
    isqrt, squared_distance, translate, BoundingBox2I, Coord, ECoord, Point2I, Vector2I, ECOORD_MAX,
};
use crate::seg::Seg;
use serde::{Deserialize, Serialize};

/// 折线类图元的公共接口
pub trait LineChainBase {
    /// 顶点数量
    fn point_count(&self) -> usize;

    /// 第 `index` 个顶点
    fn point(&self, index: usize) -> Point2I;

    /// 是否闭合
    fn is_closed(&self) -> bool;

    /// 线段数量（闭合时包含最后一点回到第一点的线段）
    fn segment_count(&self) -> usize {
        match self.point_count() {
            0 => 0,
            n if self.is_closed() => n,
            n => n - 1,
        }
    }

    /// 第 `index` 条线段
    fn segment(&self, index: usize) -> Seg {
        let n = self.point_count();
        Seg::new(self.point(index), self.point((index + 1) % n))
    }

    /// 点是否在闭合区域内部（射线法，奇偶规则）
    ///
    /// 开放折线或顶点少于3个时总是返回 `false`。
    fn point_inside(&self, p: &Point2I) -> bool {
        let n = self.point_count();
        if !self.is_closed() || n < 3 {
            return false;
        }

        let mut inside = false;
        for i in 0..n {
            let p1 = self.point(i);
            let p2 = self.point((i + 1) % n);

            if (p1.y > p.y) != (p2.y > p.y) {
                // 点在边的左侧，交叉相乘避免取整
                let dx = ECoord::from(p2.x) - ECoord::from(p1.x);
                let dy = ECoord::from(p2.y) - ECoord::from(p1.y);
                let lhs = i128::from(ECoord::from(p.x) - ECoord::from(p1.x)) * i128::from(dy);
                let rhs = i128::from(dx) * i128::from(ECoord::from(p.y) - ECoord::from(p1.y));
                let left = if dy > 0 { lhs < rhs } else { lhs > rhs };

                if left {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// 折线上距离 `p` 最近的点
    fn nearest_point(&self, p: &Point2I) -> Option<Point2I> {
        if self.point_count() == 1 {
            return Some(self.point(0));
        }

        let mut best: Option<(Point2I, ECoord)> = None;
        for i in 0..self.segment_count() {
            let pn = self.segment(i).nearest_point(p);
            let dist_sq = squared_distance(&pn, p);
            if best.map_or(true, |(_, d)| dist_sq < d) {
                best = Some((pn, dist_sq));
            }
        }
        best.map(|(pn, _)| pn)
    }

    /// 包围盒
    fn bbox(&self, clearance: Coord) -> BoundingBox2I {
        BoundingBox2I::from_points((0..self.point_count()).map(|i| self.point(i))).inflate(clearance)
    }

    /// 与单条线段的碰撞
    ///
    /// 闭合折线包含线段起点时视为重叠（距离为0）。
    fn collide_seg(&self, seg: &Seg, clearance: Coord, req: Request) -> Option<Collision> {
        if self.is_closed() && self.point_inside(&seg.a) {
            return Some(Collision::report(req, 0, seg.a));
        }

        let mut closest_dist_sq = ECOORD_MAX;
        let mut nearest = seg.a;
        let clearance_sq = Seg::square(clearance);

        for i in 0..self.segment_count() {
            let s = self.segment(i);
            let dist_sq = s.squared_distance_seg(seg);

            if dist_sq < closest_dist_sq {
                if req.location {
                    nearest = s.nearest_point_seg(seg);
                }
                closest_dist_sq = dist_sq;

                if closest_dist_sq == 0 {
                    break;
                }

                // 不需要精确距离时任何碰撞都可以
                if closest_dist_sq < clearance_sq && !req.actual {
                    break;
                }
            }
        }

        if closest_dist_sq == 0 || closest_dist_sq < clearance_sq {
            Some(Collision::report(req, isqrt(closest_dist_sq), nearest))
        } else {
            None
        }
    }
}

/// 折线自相交信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intersection {
    /// 第一条线段
    pub our: Seg,
    /// 与之相交的线段
    pub their: Seg,
    /// 交点
    pub p: Point2I,
}

/// 折线
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineChain {
    points: Vec<Point2I>,
    /// 是否闭合
    closed: bool,
}

impl LineChain {
    /// 创建空折线
    pub fn new() -> Self {
        Self::default()
    }

    /// 从点列表创建
    pub fn from_points(points: impl IntoIterator<Item = Point2I>, closed: bool) -> Self {
        Self {
            points: points.into_iter().collect(),
            closed,
        }
    }

    /// 由两点组成的单段折线
    pub fn from_segment(a: Point2I, b: Point2I) -> Self {
        Self::from_points([a, b], false)
    }

    /// 所有顶点
    pub fn points(&self) -> &[Point2I] {
        &self.points
    }

    /// 追加顶点
    pub fn append(&mut self, p: Point2I) {
        self.points.push(p);
    }

    /// 删除指定顶点
    pub fn remove(&mut self, index: usize) -> Option<Point2I> {
        (index < self.points.len()).then(|| self.points.remove(index))
    }

    /// 删除最后一个顶点
    pub fn pop(&mut self) -> Option<Point2I> {
        self.points.pop()
    }

    /// 清空
    pub fn clear(&mut self) {
        self.points.clear();
        self.closed = false;
    }

    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    pub fn first_point(&self) -> Option<Point2I> {
        self.points.first().copied()
    }

    pub fn last_point(&self) -> Option<Point2I> {
        self.points.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 平移
    pub fn move_by(&mut self, v: Vector2I) {
        for p in &mut self.points {
            *p = translate(p, &v);
        }
    }

    /// 总长度
    pub fn length(&self) -> ECoord {
        (0..self.segment_count())
            .map(|i| ECoord::from(self.segment(i).length()))
            .sum()
    }

    /// 查找自相交
    ///
    /// 非相邻线段相交，或线段穿过非相邻顶点，都视为自相交。
    /// 闭合折线中最后一段的终点与第一段的起点重合属于正常情况。
    pub fn self_intersecting(&self) -> Option<Intersection> {
        let count = self.segment_count();

        for s1 in 0..count {
            let seg1 = self.segment(s1);

            for s2 in (s1 + 1)..count {
                let seg2 = self.segment(s2);

                if s1 + 1 != s2 && seg1.contains(&seg2.a) {
                    return Some(Intersection {
                        our: seg1,
                        their: seg2,
                        p: seg2.a,
                    });
                } else if seg1.contains(&seg2.b) && !(self.closed && s1 == 0 && s2 == count - 1) {
                    return Some(Intersection {
                        our: seg1,
                        their: seg2,
                        p: seg2.b,
                    });
                } else if let Some(p) = seg1.intersect(&seg2, true, false) {
                    return Some(Intersection {
                        our: seg1,
                        their: seg2,
                        p,
                    });
                }
            }
        }

        None
    }
}

impl LineChainBase for LineChain {
    fn point_count(&self) -> usize {
        self.points.len()
    }

    fn point(&self, index: usize) -> Point2I {
        self.points[index]
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// 简单多边形：总是闭合，作为实心区域参与碰撞
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplePolygon {
    points: Vec<Point2I>,
}

impl SimplePolygon {
    pub fn new(points: impl IntoIterator<Item = Point2I>) -> Self {
        Self {
            points: points.into_iter().collect(),
        }
    }

    pub fn points(&self) -> &[Point2I] {
        &self.points
    }

    pub fn append(&mut self, p: Point2I) {
        self.points.push(p);
    }

    /// 平移
    pub fn move_by(&mut self, v: Vector2I) {
        for p in &mut self.points {
            *p = translate(p, &v);
        }
    }

    /// 转换为闭合折线
    pub fn outline(&self) -> LineChain {
        LineChain::from_points(self.points.iter().copied(), true)
    }
}

impl LineChainBase for SimplePolygon {
    fn point_count(&self) -> usize {
        self.points.len()
    }

    fn point(&self, index: usize) -> Point2I {
        self.points[index]
    }

    fn is_closed(&self) -> bool {
        true
    }
}
