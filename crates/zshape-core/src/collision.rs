//! 图元碰撞检测
//!
//! 每一对具体图元类型只有一个碰撞例程（[`PairCollide`] 实现），
//! 反向的组合由 [`coll_case_reversed`] 交换参数并取反 MTV 得到。
//!
//! MTV（最小平移向量）约定作用于第一个图元：把它平移 MTV 后两者分离。

use crate::geometry::{Arc, Circle, Rect, Segment, Shape, ARC_DEFAULT_ACCURACY};
use crate::line_chain::{LineChain, LineChainBase, SimplePolygon};
use crate::math::{
    isqrt, midpoint, squared_distance, translate, wide_delta, BoundingBox2I, Coord, ECoord, Point2I,
    Vector2E, Vector2I, VectorExt, ECOORD_MAX,
};
use crate::seg::Seg;
use rayon::prelude::*;
use std::slice;

/// 碰撞查询需要的输出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Request {
    /// 实际距离
    pub actual: bool,
    /// 碰撞位置
    pub location: bool,
    /// 最小平移向量
    pub mtv: bool,
}

impl Request {
    /// 只关心是否碰撞
    pub const HIT: Self = Self {
        actual: false,
        location: false,
        mtv: false,
    };

    /// 实际距离与位置
    pub const DISTANCE: Self = Self {
        actual: true,
        location: true,
        mtv: false,
    };

    /// 最小平移向量
    pub const MTV: Self = Self {
        actual: false,
        location: false,
        mtv: true,
    };

    pub const ALL: Self = Self {
        actual: true,
        location: true,
        mtv: true,
    };

    /// 是否为纯布尔查询
    pub fn is_boolean(&self) -> bool {
        !self.actual && !self.location && !self.mtv
    }

    /// 在子查询中比较距离时使用：总是计算实际距离
    pub(crate) fn detailed(&self) -> Self {
        Self {
            actual: true,
            location: self.location,
            mtv: false,
        }
    }
}

/// 碰撞结果，只有请求过的字段才会填充
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Collision {
    pub actual: Option<Coord>,
    pub location: Option<Point2I>,
    pub mtv: Option<Vector2I>,
}

impl Collision {
    /// 按请求填充距离和位置
    pub fn report(req: Request, actual: Coord, location: Point2I) -> Self {
        Self {
            actual: req.actual.then_some(actual),
            location: req.location.then_some(location),
            mtv: None,
        }
    }

    /// 交换两个图元的角色：MTV 取反
    pub fn reversed(self) -> Self {
        Self {
            mtv: self.mtv.map(|v| -v),
            ..self
        }
    }

    /// 去掉未请求的字段
    pub fn restrict(self, req: Request) -> Self {
        Self {
            actual: self.actual.filter(|_| req.actual),
            location: self.location.filter(|_| req.location),
            mtv: self.mtv.filter(|_| req.mtv),
        }
    }

    /// 不支持 MTV 的图元组合按零向量处理
    pub fn mtv_or_zero(&self) -> Vector2I {
        self.mtv.unwrap_or_else(Vector2I::zeros)
    }
}

/// 距离查询结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    /// 扣除宽度/半径后的剩余间隙，重叠时为0
    pub actual: Coord,
    pub location: Point2I,
}

/// 一对具体图元之间的碰撞例程
pub trait PairCollide<Rhs: ?Sized> {
    fn collide_pair(&self, other: &Rhs, clearance: Coord, req: Request) -> Option<Collision>;
}

/// 正向调用
#[inline]
pub fn coll_case<A, B>(a: &A, b: &B, clearance: Coord, req: Request) -> Option<Collision>
where
    A: PairCollide<B>,
{
    a.collide_pair(b, clearance, req)
}

/// 反向调用：交换参数，结果中的 MTV 取反
#[inline]
pub fn coll_case_reversed<A, B>(a: &A, b: &B, clearance: Coord, req: Request) -> Option<Collision>
where
    B: PairCollide<A>,
{
    b.collide_pair(a, clearance, req).map(Collision::reversed)
}

// 矩形内部时各边的外法线，顺序与 Rect::sides 一致
const RECT_SIDE_NORMALS: [(Coord, Coord); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];

#[inline]
fn to_coord(v: ECoord) -> Coord {
    v.clamp(ECoord::from(Coord::MIN), ECoord::from(Coord::MAX)) as Coord
}

/// 保留距离更小的一次命中
#[inline]
fn keep_closest(best: &mut Option<Collision>, hit: Collision) {
    let closer = best.map_or(true, |b| hit.actual.unwrap_or(0) < b.actual.unwrap_or(0));
    if closer {
        *best = Some(hit);
    }
}

/// 把圆推离线段所需的力
///
/// 最多尝试5次逐步加大的修正量，直到移动后的圆心与线段距离不小于 `clearance + r`。
fn pushout_force(circle: &Circle, seg: &Seg, clearance: Coord) -> Vector2I {
    let c = circle.center;
    let nearest = seg.nearest_point(&c);
    let away = wide_delta(&c, &nearest);
    let dist = away.int_len();
    let min_dist = clearance.saturating_add(circle.radius);

    let mut f = Vector2I::zeros();
    if dist < min_dist {
        for corr in 0..5 {
            f = away.with_length(min_dist - dist + corr);

            if seg.distance(&translate(&c, &f)) >= min_dist {
                break;
            }
        }
    }
    f
}

/// 圆心在闭合区域内部时，穿过最近的边把圆推到外面所需的力
fn escape_force<C>(circle: &Circle, chain: &C, clearance: Coord) -> Vector2I
where
    C: LineChainBase + ?Sized,
{
    let c = circle.center;
    let mut closest: Option<(Seg, Point2I, ECoord)> = None;

    for i in 0..chain.segment_count() {
        let s = chain.segment(i);
        let pn = s.nearest_point(&c);
        let dist_sq = squared_distance(&pn, &c);
        if closest.map_or(true, |(_, _, d)| dist_sq < d) {
            closest = Some((s, pn, dist_sq));
        }
    }

    let Some((side, nearest, dist_sq)) = closest else {
        return Vector2I::zeros();
    };

    let mut dir = wide_delta(&nearest, &c);
    if dir == Vector2E::zeros() {
        // 圆心正好在边上：沿边的法线指向外侧
        let d = wide_delta(&side.b, &side.a);
        dir = Vector2E::new(-d.y, d.x);
        if chain.point_inside(&translate(&c, &dir.with_length(1))) {
            dir = -dir;
        }
    }

    let min_dist = clearance.saturating_add(circle.radius);
    dir.with_length(isqrt(dist_sq).saturating_add(min_dist).saturating_add(1))
}

/// 圆与折线类图元
fn circle_vs_chain<C>(circle: &Circle, chain: &C, clearance: Coord, req: Request) -> Option<Collision>
where
    C: LineChainBase + ?Sized,
{
    let sub_req = req.detailed();
    let mut best: Option<Collision> = None;

    let contained = chain.is_closed() && chain.point_inside(&circle.center);

    if contained {
        best = Some(Collision::report(sub_req, 0, circle.center));
    } else {
        for i in 0..chain.segment_count() {
            if let Some(hit) = circle.collide_seg(&chain.segment(i), clearance, sub_req) {
                keep_closest(&mut best, hit);

                if hit.actual == Some(0) || !req.actual {
                    break;
                }
            }
        }
    }

    let mut hit = best?.restrict(req);

    if req.mtv {
        let mut moved = *circle;
        let mut total = Vector2I::zeros();

        if contained {
            total = escape_force(circle, chain, clearance);
            moved.center = translate(&moved.center, &total);
        }

        for i in 0..chain.segment_count() {
            let f = pushout_force(&moved, &chain.segment(i), clearance);
            moved.center = translate(&moved.center, &f);
            total = Vector2I::new(total.x.saturating_add(f.x), total.y.saturating_add(f.y));
        }
        hit.mtv = Some(total);
    }

    Some(hit)
}

/// 两个折线类图元：不计算 MTV
fn chain_vs_chain<A, B>(a: &A, b: &B, clearance: Coord, req: Request) -> Option<Collision>
where
    A: LineChainBase + ?Sized,
    B: LineChainBase + ?Sized,
{
    // 一个闭合区域包含另一个
    if b.is_closed() && a.point_count() > 0 && b.point_inside(&a.point(0)) {
        return Some(Collision::report(req, 0, a.point(0)));
    }
    if a.is_closed() && b.point_count() > 0 && a.point_inside(&b.point(0)) {
        return Some(Collision::report(req, 0, b.point(0)));
    }

    let sub_req = req.detailed();
    let mut best: Option<Collision> = None;

    for i in 0..b.segment_count() {
        if let Some(hit) = a.collide_seg(&b.segment(i), clearance, sub_req) {
            keep_closest(&mut best, hit);

            if hit.actual == Some(0) || !req.actual {
                break;
            }
        }
    }

    best.map(|hit| hit.restrict(req))
}

/// 折线类图元与带宽度线段
fn chain_vs_segment<C>(chain: &C, seg: &Segment, clearance: Coord, req: Request) -> Option<Collision>
where
    C: LineChainBase + ?Sized,
{
    let half_width = seg.half_width();
    chain
        .collide_seg(&seg.seg, clearance.saturating_add(half_width), req.detailed())
        .map(|hit| subtract_width(hit, half_width).restrict(req))
}

/// 矩形与折线类图元
fn rect_vs_chain<C>(rect: &Rect, chain: &C, clearance: Coord, req: Request) -> Option<Collision>
where
    C: LineChainBase + ?Sized,
{
    if chain.is_closed() && chain.point_inside(&rect.centre()) {
        return Some(Collision::report(req, 0, rect.centre()));
    }

    let sub_req = req.detailed();
    let mut best: Option<Collision> = None;

    for i in 0..chain.segment_count() {
        if let Some(hit) = rect.collide_seg(&chain.segment(i), clearance, sub_req) {
            keep_closest(&mut best, hit);

            if hit.actual == Some(0) || !req.actual {
                break;
            }
        }
    }

    best.map(|hit| hit.restrict(req))
}

#[inline]
fn subtract_width(hit: Collision, half_width: Coord) -> Collision {
    Collision {
        actual: hit.actual.map(|a| (a - half_width).max(0)),
        ..hit
    }
}

impl PairCollide<Circle> for Circle {
    fn collide_pair(&self, other: &Circle, clearance: Coord, req: Request) -> Option<Collision> {
        let min_dist =
            ECoord::from(clearance) + ECoord::from(self.radius) + ECoord::from(other.radius);
        let delta = wide_delta(&self.center, &other.center);

        if delta.wide_dot(&delta) >= i128::from(min_dist) * i128::from(min_dist) {
            return None;
        }

        let dist = ECoord::from(delta.int_len());
        let actual = to_coord(
            (dist - ECoord::from(self.radius) - ECoord::from(other.radius)).max(0),
        );

        let mut hit = Collision::report(req, actual, midpoint(&self.center, &other.center));
        if req.mtv {
            // +3 抵消取整误差，保证平移后严格不等式成立
            hit.mtv = Some(delta.with_length(to_coord(min_dist - dist + 3)));
        }
        Some(hit)
    }
}

impl PairCollide<Circle> for Rect {
    fn collide_pair(&self, other: &Circle, clearance: Coord, req: Request) -> Option<Collision> {
        let c = other.center;
        let r = other.radius;
        let min_dist = clearance.saturating_add(r);
        let min_dist_sq = Seg::square(min_dist);

        let inside = self.contains_point(&c);

        if inside && req.is_boolean() {
            return Some(Collision::default());
        }

        let mut nearest = c;
        let mut nearest_side = 0;
        let mut nearest_dist_sq = ECOORD_MAX;

        for (i, side) in self.sides().iter().enumerate() {
            let pn = side.nearest_point(&c);
            let side_dist_sq = squared_distance(&pn, &c);

            if side_dist_sq < nearest_dist_sq {
                nearest = pn;
                nearest_side = i;
                nearest_dist_sq = side_dist_sq;

                // 当前边已经碰撞，且不需要精确距离或 MTV
                let colliding = inside || side_dist_sq < min_dist_sq;
                if colliding && !req.mtv && (side_dist_sq == 0 || !req.actual) {
                    break;
                }
            }
        }

        if !inside && nearest_dist_sq >= min_dist_sq {
            return None;
        }

        let dist = isqrt(nearest_dist_sq);
        let actual = if inside { 0 } else { (dist - r).max(0) };
        let mut hit = Collision::report(req, actual, nearest);

        if req.mtv {
            let min_dist = ECoord::from(min_dist);
            let dist = ECoord::from(dist);

            // 作用在圆上的推力：外部时远离最近点，内部时穿过最近的边
            let push = if inside {
                let mut dir = wide_delta(&nearest, &c);
                if dir == Vector2E::zeros() {
                    let (x, y) = RECT_SIDE_NORMALS[nearest_side];
                    dir = Vector2E::new(ECoord::from(x), ECoord::from(y));
                }
                dir.with_length(to_coord((min_dist + 1 + dist).abs() + 1))
            } else {
                wide_delta(&c, &nearest).with_length(to_coord((min_dist + 1 - dist).abs() + 1))
            };

            hit.mtv = Some(-push);
        }

        Some(hit)
    }
}

impl PairCollide<LineChain> for Circle {
    fn collide_pair(&self, other: &LineChain, clearance: Coord, req: Request) -> Option<Collision> {
        circle_vs_chain(self, other, clearance, req)
    }
}

impl PairCollide<SimplePolygon> for Circle {
    fn collide_pair(&self, other: &SimplePolygon, clearance: Coord, req: Request) -> Option<Collision> {
        circle_vs_chain(self, other, clearance, req)
    }
}

impl PairCollide<Segment> for Circle {
    fn collide_pair(&self, other: &Segment, clearance: Coord, req: Request) -> Option<Collision> {
        let half_width = other.half_width();
        let clearance = clearance.saturating_add(half_width);

        let hit = self.collide_seg(&other.seg, clearance, req.detailed())?;
        let mut hit = subtract_width(hit, half_width).restrict(req);

        if req.mtv {
            hit.mtv = Some(pushout_force(self, &other.seg, clearance));
        }
        Some(hit)
    }
}

impl PairCollide<Rect> for Rect {
    fn collide_pair(&self, other: &Rect, clearance: Coord, req: Request) -> Option<Collision> {
        chain_vs_chain(&self.outline(), &other.outline(), clearance, req)
    }
}

impl PairCollide<LineChain> for Rect {
    fn collide_pair(&self, other: &LineChain, clearance: Coord, req: Request) -> Option<Collision> {
        rect_vs_chain(self, other, clearance, req)
    }
}

impl PairCollide<SimplePolygon> for Rect {
    fn collide_pair(&self, other: &SimplePolygon, clearance: Coord, req: Request) -> Option<Collision> {
        rect_vs_chain(self, other, clearance, req)
    }
}

impl PairCollide<Segment> for Rect {
    fn collide_pair(&self, other: &Segment, clearance: Coord, req: Request) -> Option<Collision> {
        let half_width = other.half_width();
        self.collide_seg(&other.seg, clearance.saturating_add(half_width), req.detailed())
            .map(|hit| subtract_width(hit, half_width).restrict(req))
    }
}

impl PairCollide<Segment> for Segment {
    fn collide_pair(&self, other: &Segment, clearance: Coord, req: Request) -> Option<Collision> {
        let half_width = other.half_width();
        self.collide_seg(&other.seg, clearance.saturating_add(half_width), req.detailed())
            .map(|hit| subtract_width(hit, half_width).restrict(req))
    }
}

impl PairCollide<LineChain> for LineChain {
    fn collide_pair(&self, other: &LineChain, clearance: Coord, req: Request) -> Option<Collision> {
        chain_vs_chain(self, other, clearance, req)
    }
}

impl PairCollide<SimplePolygon> for LineChain {
    fn collide_pair(&self, other: &SimplePolygon, clearance: Coord, req: Request) -> Option<Collision> {
        chain_vs_chain(self, other, clearance, req)
    }
}

impl PairCollide<SimplePolygon> for SimplePolygon {
    fn collide_pair(&self, other: &SimplePolygon, clearance: Coord, req: Request) -> Option<Collision> {
        chain_vs_chain(self, other, clearance, req)
    }
}

impl PairCollide<Segment> for LineChain {
    fn collide_pair(&self, other: &Segment, clearance: Coord, req: Request) -> Option<Collision> {
        chain_vs_segment(self, other, clearance, req)
    }
}

impl PairCollide<Segment> for SimplePolygon {
    fn collide_pair(&self, other: &Segment, clearance: Coord, req: Request) -> Option<Collision> {
        chain_vs_segment(self, other, clearance, req)
    }
}

// 圆弧先离散为折线再复用折线例程

impl PairCollide<Rect> for Arc {
    fn collide_pair(&self, other: &Rect, clearance: Coord, req: Request) -> Option<Collision> {
        let poly = self.convert_to_polyline(ARC_DEFAULT_ACCURACY);
        chain_vs_chain(&poly, &other.outline(), clearance, req)
    }
}

impl PairCollide<Circle> for Arc {
    fn collide_pair(&self, other: &Circle, clearance: Coord, req: Request) -> Option<Collision> {
        let poly = self.convert_to_polyline(ARC_DEFAULT_ACCURACY);
        circle_vs_chain(other, &poly, clearance, req).map(Collision::reversed)
    }
}

impl PairCollide<LineChain> for Arc {
    fn collide_pair(&self, other: &LineChain, clearance: Coord, req: Request) -> Option<Collision> {
        let poly = self.convert_to_polyline(ARC_DEFAULT_ACCURACY);
        chain_vs_chain(&poly, other, clearance, req)
    }
}

impl PairCollide<SimplePolygon> for Arc {
    fn collide_pair(&self, other: &SimplePolygon, clearance: Coord, req: Request) -> Option<Collision> {
        let poly = self.convert_to_polyline(ARC_DEFAULT_ACCURACY);
        chain_vs_chain(&poly, other, clearance, req)
    }
}

impl PairCollide<Segment> for Arc {
    fn collide_pair(&self, other: &Segment, clearance: Coord, req: Request) -> Option<Collision> {
        let poly = self.convert_to_polyline(ARC_DEFAULT_ACCURACY);
        chain_vs_segment(&poly, other, clearance, req)
    }
}

impl PairCollide<Arc> for Arc {
    fn collide_pair(&self, other: &Arc, clearance: Coord, req: Request) -> Option<Collision> {
        let a = self.convert_to_polyline(ARC_DEFAULT_ACCURACY);
        let b = other.convert_to_polyline(ARC_DEFAULT_ACCURACY);
        chain_vs_chain(&a, &b, clearance, req)
    }
}

/// 任意两个图元之间的碰撞
///
/// 组合图元递归展开；其余组合按类型对分派到唯一的碰撞例程。
pub fn collide_shapes(a: &Shape, b: &Shape, clearance: Coord, req: Request) -> Option<Collision> {
    use Shape as S;

    match (a, b) {
        (S::Compound(_), _) | (_, S::Compound(_)) => collide_compound(a, b, clearance, req),

        (S::Rect(a), S::Rect(b)) => coll_case(a, b, clearance, req),
        (S::Rect(a), S::Circle(b)) => coll_case(a, b, clearance, req),
        (S::Rect(a), S::LineChain(b)) => coll_case(a, b, clearance, req),
        (S::Rect(a), S::Simple(b)) => coll_case(a, b, clearance, req),
        (S::Rect(a), S::Segment(b)) => coll_case(a, b, clearance, req),
        (S::Rect(a), S::Arc(b)) => coll_case_reversed(a, b, clearance, req),

        (S::Circle(a), S::Rect(b)) => coll_case_reversed(a, b, clearance, req),
        (S::Circle(a), S::Circle(b)) => coll_case(a, b, clearance, req),
        (S::Circle(a), S::LineChain(b)) => coll_case(a, b, clearance, req),
        (S::Circle(a), S::Simple(b)) => coll_case(a, b, clearance, req),
        (S::Circle(a), S::Segment(b)) => coll_case(a, b, clearance, req),
        (S::Circle(a), S::Arc(b)) => coll_case_reversed(a, b, clearance, req),

        (S::LineChain(a), S::Rect(b)) => coll_case_reversed(a, b, clearance, req),
        (S::LineChain(a), S::Circle(b)) => coll_case_reversed(a, b, clearance, req),
        (S::LineChain(a), S::LineChain(b)) => coll_case(a, b, clearance, req),
        (S::LineChain(a), S::Simple(b)) => coll_case(a, b, clearance, req),
        (S::LineChain(a), S::Segment(b)) => coll_case(a, b, clearance, req),
        (S::LineChain(a), S::Arc(b)) => coll_case_reversed(a, b, clearance, req),

        (S::Simple(a), S::Rect(b)) => coll_case_reversed(a, b, clearance, req),
        (S::Simple(a), S::Circle(b)) => coll_case_reversed(a, b, clearance, req),
        (S::Simple(a), S::LineChain(b)) => coll_case_reversed(a, b, clearance, req),
        (S::Simple(a), S::Simple(b)) => coll_case(a, b, clearance, req),
        (S::Simple(a), S::Segment(b)) => coll_case(a, b, clearance, req),
        (S::Simple(a), S::Arc(b)) => coll_case_reversed(a, b, clearance, req),

        (S::Segment(a), S::Rect(b)) => coll_case_reversed(a, b, clearance, req),
        (S::Segment(a), S::Circle(b)) => coll_case_reversed(a, b, clearance, req),
        (S::Segment(a), S::LineChain(b)) => coll_case_reversed(a, b, clearance, req),
        (S::Segment(a), S::Simple(b)) => coll_case_reversed(a, b, clearance, req),
        (S::Segment(a), S::Segment(b)) => coll_case(a, b, clearance, req),
        (S::Segment(a), S::Arc(b)) => coll_case_reversed(a, b, clearance, req),

        (S::Arc(a), S::Rect(b)) => coll_case(a, b, clearance, req),
        (S::Arc(a), S::Circle(b)) => coll_case(a, b, clearance, req),
        (S::Arc(a), S::LineChain(b)) => coll_case(a, b, clearance, req),
        (S::Arc(a), S::Simple(b)) => coll_case(a, b, clearance, req),
        (S::Arc(a), S::Segment(b)) => coll_case(a, b, clearance, req),
        (S::Arc(a), S::Arc(b)) => coll_case(a, b, clearance, req),
    }
}

fn children(shape: &Shape) -> &[Shape] {
    match shape {
        Shape::Compound(c) => c.shapes(),
        other => slice::from_ref(other),
    }
}

/// 组合图元：遍历子图元的笛卡尔积
///
/// 最小实际距离及其位置来自同一对子图元；MTV 取模最大的一个。
fn collide_compound(a: &Shape, b: &Shape, clearance: Coord, req: Request) -> Option<Collision> {
    let sub_req = Request {
        actual: req.actual || req.location,
        location: req.location,
        mtv: req.mtv,
    };

    let mut colliding = false;
    let mut best_actual: Option<Coord> = None;
    let mut best_location: Option<Point2I> = None;
    let mut best_mtv: Option<Vector2I> = None;

    'outer: for sa in children(a) {
        for sb in children(b) {
            let Some(hit) = collide_shapes(sa, sb, clearance, sub_req) else {
                continue;
            };

            colliding = true;

            if let Some(actual) = hit.actual {
                if best_actual.map_or(true, |best| actual < best) {
                    best_actual = Some(actual);
                    best_location = hit.location;
                }
            }

            if let Some(mtv) = hit.mtv {
                if best_mtv.map_or(true, |best| mtv.squared_len() > best.squared_len()) {
                    best_mtv = Some(mtv);
                }
            }

            let can_exit = !(req.actual && best_actual.map_or(false, |d| d > 0)) && !req.mtv;
            if can_exit {
                break 'outer;
            }
        }
    }

    tracing::trace!(
        a = a.type_name(),
        b = b.type_name(),
        colliding,
        actual = ?best_actual,
        "compound collision"
    );

    colliding.then(|| Collision {
        actual: best_actual.filter(|_| req.actual),
        location: best_location.filter(|_| req.location),
        mtv: best_mtv.filter(|_| req.mtv),
    })
}

impl Shape {
    /// 是否碰撞（距离小于 `clearance`，或接触/重叠）
    pub fn collide(&self, other: &Shape, clearance: Coord) -> bool {
        collide_shapes(self, other, clearance, Request::HIT).is_some()
    }

    /// 碰撞时返回作用于 `self` 的最小平移向量；不支持 MTV 的组合返回零向量
    pub fn collide_mtv(&self, other: &Shape, clearance: Coord) -> Option<Vector2I> {
        collide_shapes(self, other, clearance, Request::MTV).map(|hit| hit.mtv_or_zero())
    }

    /// 碰撞时返回实际距离和碰撞位置
    pub fn collide_distance(&self, other: &Shape, clearance: Coord) -> Option<Contact> {
        collide_shapes(self, other, clearance, Request::DISTANCE).map(|hit| Contact {
            actual: hit.actual.unwrap_or(0),
            location: hit.location.unwrap_or_else(|| self.centre()),
        })
    }

    /// 按请求计算碰撞结果
    pub fn collide_with(&self, other: &Shape, clearance: Coord, req: Request) -> Option<Collision> {
        collide_shapes(self, other, clearance, req)
    }
}

#[inline]
fn may_collide(bbox: &BoundingBox2I, other: &Shape) -> bool {
    bbox.intersects(&other.bbox(0))
}

/// 并行查找与 `shape` 碰撞的所有图元，返回它们在 `others` 中的下标
pub fn find_colliding(shape: &Shape, others: &[Shape], clearance: Coord) -> Vec<usize> {
    let bbox = shape.bbox(clearance);

    let hits: Vec<usize> = others
        .par_iter()
        .enumerate()
        .filter(|(_, other)| may_collide(&bbox, other) && shape.collide(other, clearance))
        .map(|(i, _)| i)
        .collect();

    tracing::debug!(candidates = others.len(), hits = hits.len(), "batch collision query");
    hits
}

/// 并行检查 `shape` 是否与任一图元碰撞
pub fn collide_any_of(shape: &Shape, others: &[Shape], clearance: Coord) -> bool {
    let bbox = shape.bbox(clearance);

    others
        .par_iter()
        .any(|other| may_collide(&bbox, other) && shape.collide(other, clearance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Compound;

    fn circle(x: Coord, y: Coord, r: Coord) -> Shape {
        Shape::Circle(Circle::new(Point2I::new(x, y), r))
    }

    fn rect(x: Coord, y: Coord, w: Coord, h: Coord) -> Shape {
        Shape::Rect(Rect::new(Point2I::new(x, y), w, h))
    }

    fn segment(ax: Coord, ay: Coord, bx: Coord, by: Coord, width: Coord) -> Shape {
        Shape::Segment(Segment::new(Point2I::new(ax, ay), Point2I::new(bx, by), width))
    }

    fn chain(points: &[(Coord, Coord)], closed: bool) -> Shape {
        Shape::LineChain(LineChain::from_points(
            points.iter().map(|&(x, y)| Point2I::new(x, y)),
            closed,
        ))
    }

    #[test]
    fn test_circle_circle() {
        let mut a = circle(0, 0, 5);
        let b = circle(8, 0, 5);

        assert!(a.collide(&b, 0));

        let contact = a.collide_distance(&b, 0).unwrap();
        assert_eq!(contact.actual, 0);
        assert_eq!(contact.location, Point2I::new(4, 0));

        let mtv = a.collide_mtv(&b, 0).unwrap();
        assert_eq!(mtv, Vector2I::new(-5, 0));

        a.move_by(mtv);
        assert!(!a.collide(&b, 0));
    }

    #[test]
    fn test_circle_circle_clearance_exclusive() {
        let a = circle(0, 0, 5);
        let b = circle(20, 0, 5);
        assert!(!a.collide(&b, 10));
        assert_eq!(a.collide_distance(&b, 11).unwrap().actual, 10);
    }

    #[test]
    fn test_rect_circle_inside() {
        let mut r = rect(0, 0, 10, 10);
        let c = circle(5, 5, 1);

        assert!(r.collide(&c, 0));
        assert_eq!(r.collide_distance(&c, 0).unwrap().actual, 0);

        // MTV 作用于矩形
        let mtv = r.collide_mtv(&c, 0).unwrap();
        assert_eq!(mtv, Vector2I::new(8, 0));
        r.move_by(mtv);
        assert!(!r.collide(&c, 0));
    }

    #[test]
    fn test_rect_circle_clearance_boundary() {
        let r = rect(0, 0, 10, 10);
        let c = circle(20, 5, 1);

        assert!(!r.collide(&c, 5));
        // 距离恰好等于阈值不算碰撞
        assert!(!r.collide(&c, 9));

        let contact = r.collide_distance(&c, 10).unwrap();
        assert_eq!(contact.actual, 9);
        assert_eq!(contact.location, Point2I::new(10, 5));
    }

    #[test]
    fn test_rect_circle_centre_on_edge() {
        let r = rect(0, 0, 10, 10);
        let c = circle(0, 5, 2);

        let mtv = r.collide_mtv(&c, 0).unwrap();
        assert!(mtv.x > 0);
        assert_eq!(mtv.y, 0);
    }

    #[test]
    fn test_reversed_pair_negates_mtv() {
        let r = rect(0, 0, 10, 10);
        let c = circle(12, 5, 3);

        let forward = r.collide_mtv(&c, 0).unwrap();
        let backward = c.collide_mtv(&r, 0).unwrap();
        assert_eq!(forward, -backward);
        assert_eq!(backward, Vector2I::new(3, 0));
    }

    #[test]
    fn test_circle_chain_pushout() {
        let mut c = circle(5, 3, 5);
        let l = chain(&[(0, 0), (10, 0), (20, 0)], false);

        let hit = c.collide_with(&l, 0, Request::ALL).unwrap();
        assert_eq!(hit.actual, Some(0));
        assert_eq!(hit.location, Some(Point2I::new(5, 0)));

        let mtv = hit.mtv.unwrap();
        assert!(mtv.y > 0);
        c.move_by(mtv);
        assert!(!c.collide(&l, 0));
    }

    #[test]
    fn test_circle_inside_closed_chain() {
        let c = circle(50, 50, 5);
        let square = chain(&[(0, 0), (100, 0), (100, 100), (0, 100)], true);
        let open = chain(&[(0, 0), (100, 0), (100, 100), (0, 100)], false);

        let contact = c.collide_distance(&square, 0).unwrap();
        assert_eq!(contact.actual, 0);
        assert_eq!(contact.location, Point2I::new(50, 50));
        assert!(!c.collide(&open, 0));
        assert!(square.collide(&c, 0));
    }

    #[test]
    fn test_circle_inside_closed_chain_pushout() {
        let mut c = circle(50, 40, 5);
        let square = chain(&[(0, 0), (100, 0), (100, 100), (0, 100)], true);

        // 穿过最近的底边推出
        let mtv = c.collide_mtv(&square, 0).unwrap();
        assert_eq!(mtv, Vector2I::new(0, -46));
        assert_eq!(square.collide_mtv(&c, 0), Some(Vector2I::new(0, 46)));

        c.move_by(mtv);
        assert!(!c.collide(&square, 0));

        // 凹多边形：从缺口一侧推出
        let notch = chain(
            &[
                (0, 0),
                (100, 0),
                (100, 100),
                (60, 100),
                (60, 20),
                (40, 20),
                (40, 100),
                (0, 100),
            ],
            true,
        );
        let mut deep = circle(20, 60, 5);
        let mtv = deep.collide_mtv(&notch, 3).unwrap();
        deep.move_by(mtv);
        assert!(!deep.collide(&notch, 3));
    }

    #[test]
    fn test_far_apart_shapes() {
        const FAR: Coord = 2_000_000_000;

        let left = circle(-FAR, 0, 5);
        let right = circle(FAR, 0, 5);
        assert!(!left.collide(&right, 0));
        assert_eq!(left.collide_mtv(&right, 0), None);

        let long = segment(-FAR, 0, FAR, 0, 10);
        let above = circle(0, 100, 5);
        assert!(!long.collide(&above, 0));
        assert_eq!(above.collide_distance(&long, 100).unwrap().actual, 90);
        assert_eq!(above.collide_mtv(&long, 100), Some(Vector2I::new(0, 10)));

        let r = rect(FAR, -10, 100_000_000, 20);
        assert!(!r.collide(&left, 0));
        assert!(r.collide(&circle(FAR - 3, 0, 5), 0));

        let wide = chain(&[(-FAR, -FAR), (FAR, -FAR), (FAR, FAR), (-FAR, FAR)], true);
        assert!(wide.collide(&right, 0));
        assert!(wide.collide(&long, 0));
        assert_eq!(find_colliding(&left, &[right, long, wide], 0), vec![1, 2]);
    }

    #[test]
    fn test_circle_segment_width() {
        let c = circle(0, 10, 2);
        let s = segment(-10, 0, 10, 0, 6);

        // 间隙 = 10 - 2 - 3 = 5
        assert!(!c.collide(&s, 5));
        let contact = c.collide_distance(&s, 6).unwrap();
        assert_eq!(contact.actual, 5);

        let mut moved = c.clone();
        let mtv = moved.collide_mtv(&s, 6).unwrap();
        assert!(mtv.y > 0);
        moved.move_by(mtv);
        assert!(!moved.collide(&s, 6));
    }

    #[test]
    fn test_segment_segment() {
        let a = segment(0, 0, 100, 0, 10);
        let b = segment(0, 20, 100, 20, 10);

        // 间隙 = 20 - 5 - 5 = 10
        assert!(!a.collide(&b, 10));
        assert_eq!(a.collide_distance(&b, 11).unwrap().actual, 10);
        assert_eq!(b.collide_distance(&a, 11).unwrap().actual, 10);

        // 无 MTV 支持，按零向量处理
        assert_eq!(a.collide_mtv(&b, 11), Some(Vector2I::zeros()));
    }

    #[test]
    fn test_chain_chain() {
        let a = chain(&[(0, 0), (10, 0), (10, 10)], false);
        let b = chain(&[(20, 0), (20, 10)], false);

        assert!(!a.collide(&b, 10));
        assert_eq!(a.collide_distance(&b, 11).unwrap().actual, 10);

        let crossing = chain(&[(5, -5), (5, 5)], false);
        assert_eq!(a.collide_distance(&crossing, 0).unwrap().actual, 0);
        assert!(a.collide(&crossing, 0));
    }

    #[test]
    fn test_closed_chain_containment_both_ways() {
        let outer = chain(&[(0, 0), (100, 0), (100, 100), (0, 100)], true);
        let inner = chain(&[(40, 40), (60, 40), (60, 60)], false);

        assert!(outer.collide(&inner, 0));
        assert!(inner.collide(&outer, 0));

        let simple = Shape::Simple(SimplePolygon::new([
            Point2I::new(40, 40),
            Point2I::new(60, 40),
            Point2I::new(60, 60),
        ]));
        assert!(outer.collide(&simple, 0));
        assert!(simple.collide(&outer, 0));
    }

    #[test]
    fn test_rect_rect_and_rect_segment() {
        let a = rect(0, 0, 10, 10);
        let b = rect(15, 0, 10, 10);

        assert!(!a.collide(&b, 5));
        assert_eq!(a.collide_distance(&b, 6).unwrap().actual, 5);

        let s = segment(20, 5, 30, 5, 4);
        assert!(!a.collide(&s, 8));
        assert_eq!(a.collide_distance(&s, 9).unwrap().actual, 8);
        assert_eq!(s.collide_distance(&a, 9).unwrap().actual, 8);
    }

    #[test]
    fn test_rect_inside_closed_chain() {
        let outer = chain(&[(0, 0), (100, 0), (100, 100), (0, 100)], true);
        let r = rect(40, 40, 10, 10);
        assert!(r.collide(&outer, 0));
        assert!(outer.collide(&r, 0));
    }

    #[test]
    fn test_arc_pairs() {
        let arc = Shape::Arc(Arc::new(Point2I::new(0, 0), Point2I::new(100, 0), 180.0));

        let c = circle(0, 110, 5);
        assert!(!arc.collide(&c, 4));
        assert!(arc.collide(&c, 6));

        // 圆弧在前时 MTV 作用于圆弧，与反向调用互为相反数
        let forward = arc.collide_mtv(&c, 6).unwrap();
        let backward = c.collide_mtv(&arc, 6).unwrap();
        assert_eq!(forward, -backward);
        assert!(backward.y > 0);

        let r = rect(-10, 95, 20, 20);
        assert!(arc.collide(&r, 0));
        assert!(r.collide(&arc, 0));

        let s = segment(-200, -10, 200, -10, 2);
        assert!(!arc.collide(&s, 5));
        assert!(arc.collide(&s, 10));

        let other = Shape::Arc(Arc::new(Point2I::new(0, 0), Point2I::new(-100, 0), 180.0));
        assert!(arc.collide(&other, 0));
    }

    #[test]
    fn test_compound_aggregation() {
        let compound = Shape::Compound(Compound::new(vec![circle(12, 5, 3), circle(50, 5, 3)]));
        let r = rect(0, 0, 10, 10);

        let hit = compound.collide_with(&r, 0, Request::ALL).unwrap();
        let direct = circle(12, 5, 3).collide_with(&r, 0, Request::ALL).unwrap();

        assert_eq!(hit.actual, Some(0));
        assert_eq!(hit.location, Some(Point2I::new(10, 5)));
        assert_eq!(hit.mtv, Some(Vector2I::new(3, 0)));
        assert_eq!(hit, direct);

        // 反向：MTV 取反
        let reversed = r.collide_with(&compound, 0, Request::ALL).unwrap();
        assert_eq!(reversed.mtv, Some(Vector2I::new(-3, 0)));
    }

    #[test]
    fn test_compound_minimum_actual() {
        let compound = Shape::Compound(Compound::new(vec![circle(30, 5, 2), circle(20, 5, 2)]));
        let r = rect(0, 0, 10, 10);

        let contact = compound.collide_distance(&r, 20).unwrap();
        assert_eq!(contact.actual, 8);
        assert_eq!(contact.location, Point2I::new(10, 5));
    }

    #[test]
    fn test_nested_compound() {
        let inner = Shape::Compound(Compound::new(vec![circle(100, 100, 1)]));
        let outer = Shape::Compound(Compound::new(vec![inner, rect(0, 0, 10, 10)]));

        assert!(outer.collide(&circle(5, 5, 1), 0));
        assert!(outer.collide(&circle(100, 102, 2), 0));
        assert!(!outer.collide(&circle(50, 50, 2), 0));

        let empty = Shape::Compound(Compound::default());
        assert!(!empty.collide(&outer, 1000));
    }

    #[test]
    fn test_batch_queries() {
        let query = circle(0, 0, 10);
        let others = vec![
            circle(100, 0, 5),
            rect(5, 5, 10, 10),
            segment(-50, 30, 50, 30, 2),
            circle(-15, 0, 6),
        ];

        assert_eq!(find_colliding(&query, &others, 0), vec![1, 3]);
        assert_eq!(find_colliding(&query, &others, 20), vec![1, 2, 3]);
        assert!(collide_any_of(&query, &others, 0));
        assert!(!collide_any_of(&circle(500, 500, 1), &others, 0));
    }

    #[test]
    fn test_request_outputs() {
        let a = circle(0, 0, 5);
        let b = circle(8, 0, 5);

        let hit = a.collide_with(&b, 0, Request::HIT).unwrap();
        assert_eq!(hit, Collision::default());

        let hit = a.collide_with(&b, 0, Request::MTV).unwrap();
        assert!(hit.actual.is_none());
        assert!(hit.location.is_none());
        assert!(hit.mtv.is_some());
    }
}
