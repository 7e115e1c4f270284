//! 几何图元定义
//!
//! 支持的碰撞图元：
//! - 矩形 (Rect)
//! - 圆 (Circle)
//! - 带宽度线段 (Segment)
//! - 折线 (LineChain)
//! - 简单多边形 (SimplePolygon)
//! - 圆弧 (Arc)
//! - 组合图元 (Compound)

use crate::collision::{Collision, Request};
use crate::error::ShapeError;
use crate::line_chain::{LineChain, LineChainBase, SimplePolygon};
use crate::math::{
    isqrt, midpoint, round_coord, squared_distance, translate, wide_delta, BoundingBox2I, Coord,
    Point2I, Vector2I, VectorExt, ECOORD_MAX,
};
use crate::seg::Seg;
use serde::{Deserialize, Serialize};

/// 圆弧离散化默认弦高误差
pub const ARC_DEFAULT_ACCURACY: Coord = 5000;

/// 整圆离散化时的最少线段数
const MIN_SEGCOUNT_FOR_CIRCLE: f64 = 8.0;

/// 图元类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeType {
    Rect,
    Circle,
    Segment,
    LineChain,
    Simple,
    Arc,
    Compound,
}

impl ShapeType {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeType::Rect => "Rect",
            ShapeType::Circle => "Circle",
            ShapeType::Segment => "Segment",
            ShapeType::LineChain => "LineChain",
            ShapeType::Simple => "Simple",
            ShapeType::Arc => "Arc",
            ShapeType::Compound => "Compound",
        }
    }
}

/// 可参与碰撞检测的图元
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rect(Rect),
    Circle(Circle),
    Segment(Segment),
    LineChain(LineChain),
    Simple(SimplePolygon),
    Arc(Arc),
    Compound(Compound),
}

impl Shape {
    /// 获取类型标签
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Shape::Rect(_) => ShapeType::Rect,
            Shape::Circle(_) => ShapeType::Circle,
            Shape::Segment(_) => ShapeType::Segment,
            Shape::LineChain(_) => ShapeType::LineChain,
            Shape::Simple(_) => ShapeType::Simple,
            Shape::Arc(_) => ShapeType::Arc,
            Shape::Compound(_) => ShapeType::Compound,
        }
    }

    /// 获取类型名称
    pub fn type_name(&self) -> &'static str {
        self.shape_type().name()
    }

    /// 包围盒（向外扩展 `clearance`）
    pub fn bbox(&self, clearance: Coord) -> BoundingBox2I {
        match self {
            Shape::Rect(r) => r.bbox(clearance),
            Shape::Circle(c) => c.bbox(clearance),
            Shape::Segment(s) => s.bbox(clearance),
            Shape::LineChain(l) => l.bbox(clearance),
            Shape::Simple(s) => s.bbox(clearance),
            Shape::Arc(a) => a.bbox(clearance),
            Shape::Compound(c) => c.bbox(clearance),
        }
    }

    /// 中心点
    pub fn centre(&self) -> Point2I {
        match self {
            Shape::Rect(r) => r.centre(),
            Shape::Circle(c) => c.center,
            Shape::Segment(s) => midpoint(&s.seg.a, &s.seg.b),
            _ => self.bbox(0).center(),
        }
    }

    /// 平移
    pub fn move_by(&mut self, v: Vector2I) {
        match self {
            Shape::Rect(r) => r.origin = translate(&r.origin, &v),
            Shape::Circle(c) => c.center = translate(&c.center, &v),
            Shape::Segment(s) => {
                s.seg.a = translate(&s.seg.a, &v);
                s.seg.b = translate(&s.seg.b, &v);
            }
            Shape::LineChain(l) => l.move_by(v),
            Shape::Simple(s) => s.move_by(v),
            Shape::Arc(a) => {
                a.center = translate(&a.center, &v);
                a.start = translate(&a.start, &v);
            }
            Shape::Compound(c) => c.move_by(v),
        }
    }

    /// 与单条线段的碰撞
    pub fn collide_seg(&self, seg: &Seg, clearance: Coord, req: Request) -> Option<Collision> {
        match self {
            Shape::Rect(r) => r.collide_seg(seg, clearance, req),
            Shape::Circle(c) => c.collide_seg(seg, clearance, req),
            Shape::Segment(s) => s.collide_seg(seg, clearance, req),
            Shape::LineChain(l) => l.collide_seg(seg, clearance, req),
            Shape::Simple(s) => s.collide_seg(seg, clearance, req),
            Shape::Arc(a) => a.convert_to_polyline(ARC_DEFAULT_ACCURACY).collide_seg(seg, clearance, req),
            Shape::Compound(c) => c.collide_seg(seg, clearance, req),
        }
    }

    /// 点是否落在图元上或 `clearance` 范围内
    pub fn collide_point(&self, p: &Point2I, clearance: Coord) -> bool {
        self.collide_seg(&Seg::new(*p, *p), clearance, Request::HIT).is_some()
    }
}

impl From<Rect> for Shape {
    fn from(r: Rect) -> Self {
        Shape::Rect(r)
    }
}

impl From<Circle> for Shape {
    fn from(c: Circle) -> Self {
        Shape::Circle(c)
    }
}

impl From<Segment> for Shape {
    fn from(s: Segment) -> Self {
        Shape::Segment(s)
    }
}

impl From<LineChain> for Shape {
    fn from(l: LineChain) -> Self {
        Shape::LineChain(l)
    }
}

impl From<SimplePolygon> for Shape {
    fn from(s: SimplePolygon) -> Self {
        Shape::Simple(s)
    }
}

impl From<Arc> for Shape {
    fn from(a: Arc) -> Self {
        Shape::Arc(a)
    }
}

impl From<Compound> for Shape {
    fn from(c: Compound) -> Self {
        Shape::Compound(c)
    }
}

/// 轴对齐矩形
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    /// 左下角
    pub origin: Point2I,
    /// 尺寸（宽、高）
    pub size: Vector2I,
}

impl Rect {
    pub fn new(origin: Point2I, width: Coord, height: Coord) -> Self {
        Self {
            origin,
            size: Vector2I::new(width, height),
        }
    }

    /// 创建并校验尺寸非负
    pub fn try_new(origin: Point2I, width: Coord, height: Coord) -> Result<Self, ShapeError> {
        if width < 0 || height < 0 {
            return Err(ShapeError::NegativeSize(width, height));
        }
        Ok(Self::new(origin, width, height))
    }

    pub fn width(&self) -> Coord {
        self.size.x
    }

    pub fn height(&self) -> Coord {
        self.size.y
    }

    /// 中心点
    pub fn centre(&self) -> Point2I {
        translate(&self.origin, &(self.size / 2))
    }

    /// 四个角点，从原点开始依次为 (x, y+h)、(x+w, y+h)、(x+w, y)
    ///
    /// 超出坐标范围的角点饱和到边界。
    pub fn corners(&self) -> [Point2I; 4] {
        let p0 = self.origin;
        let x1 = p0.x.saturating_add(self.size.x);
        let y1 = p0.y.saturating_add(self.size.y);
        [
            p0,
            Point2I::new(p0.x, y1),
            Point2I::new(x1, y1),
            Point2I::new(x1, p0.y),
        ]
    }

    /// 四条边
    pub fn sides(&self) -> [Seg; 4] {
        let c = self.corners();
        [
            Seg::new(c[0], c[1]),
            Seg::new(c[1], c[2]),
            Seg::new(c[2], c[3]),
            Seg::new(c[3], c[0]),
        ]
    }

    /// 闭合轮廓
    pub fn outline(&self) -> LineChain {
        LineChain::from_points(self.corners(), true)
    }

    /// 点是否在矩形内（边界上也算）
    pub fn contains_point(&self, p: &Point2I) -> bool {
        self.bbox(0).contains(p)
    }

    pub fn bbox(&self, clearance: Coord) -> BoundingBox2I {
        BoundingBox2I::from_points(self.corners()).inflate(clearance)
    }

    /// 与单条线段的碰撞
    pub fn collide_seg(&self, seg: &Seg, clearance: Coord, req: Request) -> Option<Collision> {
        for end in [seg.a, seg.b] {
            if self.contains_point(&end) {
                return Some(Collision::report(req, 0, end));
            }
        }

        let mut closest_dist_sq = ECOORD_MAX;
        let mut nearest = seg.a;

        for side in self.sides() {
            let dist_sq = side.squared_distance_seg(seg);

            if dist_sq < closest_dist_sq {
                if req.location {
                    nearest = side.nearest_point_seg(seg);
                }
                closest_dist_sq = dist_sq;
            }
        }

        if closest_dist_sq == 0 || closest_dist_sq < Seg::square(clearance) {
            Some(Collision::report(req, isqrt(closest_dist_sq), nearest))
        } else {
            None
        }
    }
}

/// 圆
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2I,
    pub radius: Coord,
}

impl Circle {
    pub fn new(center: Point2I, radius: Coord) -> Self {
        Self { center, radius }
    }

    /// 创建并校验半径非负
    pub fn try_new(center: Point2I, radius: Coord) -> Result<Self, ShapeError> {
        if radius < 0 {
            return Err(ShapeError::NegativeRadius(radius));
        }
        Ok(Self::new(center, radius))
    }

    pub fn bbox(&self, clearance: Coord) -> BoundingBox2I {
        BoundingBox2I::new(self.center, self.center).inflate(self.radius.saturating_add(clearance))
    }

    /// 与单条线段的碰撞；半径为0的圆退化为点
    pub fn collide_seg(&self, seg: &Seg, clearance: Coord, req: Request) -> Option<Collision> {
        let min_dist = i128::from(clearance) + i128::from(self.radius);
        let pn = seg.nearest_point(&self.center);
        let dist_sq = squared_distance(&pn, &self.center);

        if dist_sq == 0 || i128::from(dist_sq) < min_dist * min_dist {
            let actual = (isqrt(dist_sq) - self.radius).max(0);
            Some(Collision::report(req, actual, pn))
        } else {
            None
        }
    }
}

/// 带宽度的线段（两端为半圆的"跑道"形）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub seg: Seg,
    pub width: Coord,
}

impl Segment {
    pub fn new(a: Point2I, b: Point2I, width: Coord) -> Self {
        Self {
            seg: Seg::new(a, b),
            width,
        }
    }

    /// 创建并校验宽度非负
    pub fn try_new(a: Point2I, b: Point2I, width: Coord) -> Result<Self, ShapeError> {
        if width < 0 {
            return Err(ShapeError::NegativeWidth(width));
        }
        Ok(Self::new(a, b, width))
    }

    /// 半宽（向上取整），宽度折算进间距时统一使用
    pub fn half_width(&self) -> Coord {
        (self.width + 1) / 2
    }

    pub fn bbox(&self, clearance: Coord) -> BoundingBox2I {
        BoundingBox2I::from_points([self.seg.a, self.seg.b])
            .inflate(self.half_width().saturating_add(clearance))
    }

    /// 与单条线段的碰撞，实际距离已扣除半宽
    pub fn collide_seg(&self, seg: &Seg, clearance: Coord, req: Request) -> Option<Collision> {
        let half_width = self.half_width();
        let min_dist = half_width.saturating_add(clearance);
        let dist_sq = self.seg.squared_distance_seg(seg);

        if dist_sq == 0 || dist_sq < Seg::square(min_dist) {
            let location = if req.location {
                self.seg.nearest_point_seg(seg)
            } else {
                seg.a
            };
            let actual = (isqrt(dist_sq) - half_width).max(0);
            Some(Collision::report(req, actual, location))
        } else {
            None
        }
    }
}

/// 圆弧：圆心、起点和圆心角（度，正值为逆时针）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub center: Point2I,
    pub start: Point2I,
    pub central_angle: f64,
}

impl Arc {
    pub fn new(center: Point2I, start: Point2I, central_angle: f64) -> Self {
        Self {
            center,
            start,
            central_angle,
        }
    }

    /// 从起点、中间点、终点创建圆弧
    pub fn from_three_points(start: Point2I, mid: Point2I, end: Point2I) -> Result<Self, ShapeError> {
        if start == mid || mid == end || start == end {
            return Err(ShapeError::CoincidentArcPoints);
        }

        let (p1, p2, p3) = (to_f64(start), to_f64(mid), to_f64(end));

        // 计算外接圆圆心
        let d = 2.0 * (p1.0 * (p2.1 - p3.1) + p2.0 * (p3.1 - p1.1) + p3.0 * (p1.1 - p2.1));
        if d.abs() < f64::EPSILON {
            return Err(ShapeError::CollinearArcPoints);
        }

        let s1 = p1.0 * p1.0 + p1.1 * p1.1;
        let s2 = p2.0 * p2.0 + p2.1 * p2.1;
        let s3 = p3.0 * p3.0 + p3.1 * p3.1;
        let ux = (s1 * (p2.1 - p3.1) + s2 * (p3.1 - p1.1) + s3 * (p1.1 - p2.1)) / d;
        let uy = (s1 * (p3.0 - p2.0) + s2 * (p1.0 - p3.0) + s3 * (p2.0 - p1.0)) / d;

        let angle_of = |p: (f64, f64)| (p.1 - uy).atan2(p.0 - ux).to_degrees();
        let sa = angle_of(p1);
        let ma = angle_of(p2);
        let ea = angle_of(p3);

        // 中间点落在逆时针扫掠范围内则为逆时针，否则为顺时针
        let ccw_sweep = normalize_degrees(ea - sa);
        let central_angle = if normalize_degrees(ma - sa) < ccw_sweep {
            ccw_sweep
        } else {
            ccw_sweep - 360.0
        };

        Ok(Self::new(
            Point2I::new(round_coord(ux), round_coord(uy)),
            start,
            central_angle,
        ))
    }

    /// 半径（截断）
    pub fn radius(&self) -> Coord {
        wide_delta(&self.start, &self.center).int_len()
    }

    /// 起始角度（度）
    pub fn start_angle(&self) -> f64 {
        let v = wide_delta(&self.start, &self.center);
        (v.y as f64).atan2(v.x as f64).to_degrees()
    }

    /// 终止角度（度）
    pub fn end_angle(&self) -> f64 {
        self.start_angle() + self.central_angle
    }

    pub fn start_point(&self) -> Point2I {
        self.start
    }

    pub fn end_point(&self) -> Point2I {
        self.rotated_start(self.central_angle)
    }

    pub fn mid_point(&self) -> Point2I {
        self.rotated_start(self.central_angle / 2.0)
    }

    fn rotated_start(&self, degrees: f64) -> Point2I {
        let v = wide_delta(&self.start, &self.center).rotated(degrees.to_radians());
        translate(&self.center, &v)
    }

    /// 弧长
    pub fn length(&self) -> f64 {
        self.central_angle.abs().to_radians() * self.float_radius()
    }

    /// 检查角度（度）是否在弧的范围内
    fn contains_angle(&self, angle: f64) -> bool {
        let (low, sweep) = if self.central_angle >= 0.0 {
            (self.start_angle(), self.central_angle)
        } else {
            (self.start_angle() + self.central_angle, -self.central_angle)
        };

        if sweep >= 360.0 {
            return true;
        }
        normalize_degrees(angle - low) <= sweep
    }

    pub fn bbox(&self, clearance: Coord) -> BoundingBox2I {
        let mut bbox = BoundingBox2I::from_points([self.start_point(), self.end_point()]);

        // 检查象限点
        let r = self.float_radius();
        for angle in [0.0_f64, 90.0, 180.0, 270.0] {
            if self.contains_angle(angle) {
                let a = angle.to_radians();
                bbox.expand_to_include(&Point2I::new(
                    round_coord(f64::from(self.center.x) + r * a.cos()),
                    round_coord(f64::from(self.center.y) + r * a.sin()),
                ));
            }
        }

        bbox.inflate(clearance)
    }

    /// 按弦高误差将圆弧离散为折线
    pub fn convert_to_polyline(&self, accuracy: Coord) -> LineChain {
        let r = self.float_radius();
        let sa = self.start_angle();
        let ca = self.central_angle;
        let n = arc_to_segment_count(r, accuracy, ca);

        // 端点使用精确值，中间点按角度均分
        let mut chain = LineChain::new();
        chain.append(self.start);
        for i in 1..n {
            let a = (sa + ca * i as f64 / n as f64).to_radians();
            chain.append(Point2I::new(
                round_coord(f64::from(self.center.x) + r * a.cos()),
                round_coord(f64::from(self.center.y) + r * a.sin()),
            ));
        }
        chain.append(self.end_point());
        chain
    }

    fn float_radius(&self) -> f64 {
        let v = wide_delta(&self.start, &self.center);
        (v.x as f64).hypot(v.y as f64)
    }
}

/// 给定最大弦高误差，计算圆弧离散所需线段数（至少为1）
pub fn arc_to_segment_count(radius: f64, error_max: Coord, arc_angle_degrees: f64) -> usize {
    let max_increment = 360.0 / MIN_SEGCOUNT_FOR_CIRCLE;

    let arc_increment = if radius <= f64::from(error_max) || error_max <= 0 {
        max_increment
    } else {
        let rel_error = f64::from(error_max) / radius;
        ((1.0 - rel_error).acos().to_degrees() * 2.0).min(max_increment)
    };

    let count = (arc_angle_degrees.abs() / arc_increment).round() as usize;
    count.max(1)
}

/// 组合图元：拥有一组子图元，作为一个整体参与碰撞
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Compound {
    shapes: Vec<Shape>,
}

impl Compound {
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self { shapes }
    }

    /// 添加子图元
    pub fn add_shape(&mut self, shape: impl Into<Shape>) {
        self.shapes.push(shape.into());
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn bbox(&self, clearance: Coord) -> BoundingBox2I {
        self.shapes
            .iter()
            .fold(BoundingBox2I::empty(), |acc, s| acc.union(&s.bbox(clearance)))
    }

    pub fn move_by(&mut self, v: Vector2I) {
        for shape in &mut self.shapes {
            shape.move_by(v);
        }
    }

    /// 与单条线段的碰撞，取所有子图元中距离最小者
    pub fn collide_seg(&self, seg: &Seg, clearance: Coord, req: Request) -> Option<Collision> {
        let sub_req = req.detailed();
        let mut best: Option<Collision> = None;

        for shape in &self.shapes {
            if let Some(hit) = shape.collide_seg(seg, clearance, sub_req) {
                let closer = best.map_or(true, |b| hit.actual.unwrap_or(0) < b.actual.unwrap_or(0));
                if closer {
                    best = Some(hit);
                }
                if !req.actual || hit.actual == Some(0) {
                    break;
                }
            }
        }

        best.map(|b| b.restrict(req))
    }
}

fn to_f64(p: Point2I) -> (f64, f64) {
    (f64::from(p.x), f64::from(p.y))
}

/// 归一化到 [0, 360)
fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}
