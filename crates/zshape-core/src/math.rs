//! 数学基础类型
//!
//! 坐标统一使用整数（`i32`），平方距离等中间结果使用扩展精度（`i64`），
//! 避免大坐标下的溢出。向量/点类型基于 nalgebra。

use nalgebra as na;
use serde::{Deserialize, Serialize};

/// 坐标类型
pub type Coord = i32;

/// 扩展精度坐标，用于平方距离、叉积等
pub type ECoord = i64;

/// 整数2D点
pub type Point2I = na::Point2<Coord>;

/// 整数2D向量
pub type Vector2I = na::Vector2<Coord>;

/// 扩展精度2D向量，两点之差一律用它表示
pub type Vector2E = na::Vector2<ECoord>;

/// 浮点2D向量（旋转、圆弧离散化等中间计算）
pub type Vector2 = na::Vector2<f64>;

/// 扩展精度的最大值，作为"尚未找到"的距离初值
pub const ECOORD_MAX: ECoord = ECoord::MAX;

/// 四舍五入（远离零）到坐标
#[inline]
pub fn round_coord(v: f64) -> Coord {
    v.round() as Coord
}

/// 截断到坐标范围
#[inline]
pub fn clamp_coord(v: impl Into<i128>) -> Coord {
    let v: i128 = v.into();
    v.clamp(i128::from(Coord::MIN), i128::from(Coord::MAX)) as Coord
}

/// 计算 `value * numerator / denominator`，128位中间结果，四舍五入（远离零）
///
/// `denominator` 不能为 0，结果超出 `ECoord` 时饱和。
pub fn rescale(
    numerator: impl Into<i128>,
    value: impl Into<i128>,
    denominator: impl Into<i128>,
) -> ECoord {
    let den: i128 = denominator.into();
    debug_assert!(den != 0, "rescale by zero");

    let num = numerator.into().saturating_mul(value.into());
    let half = den.abs() / 2;
    let magnitude = num.unsigned_abs().saturating_add(half.unsigned_abs()) / den.unsigned_abs();
    let magnitude = i128::try_from(magnitude).unwrap_or(i128::MAX);
    let r = if (num < 0) == (den < 0) { magnitude } else { -magnitude };

    ECoord::try_from(r).unwrap_or(if r < 0 { ECoord::MIN } else { ECoord::MAX })
}

/// 整数平方根（截断）
pub fn isqrt(v: ECoord) -> Coord {
    if v <= 0 {
        return 0;
    }
    let mut r = (v as f64).sqrt() as ECoord;
    // 修正浮点误差
    while r > 0 && r.saturating_mul(r) > v {
        r -= 1;
    }
    while (r + 1).saturating_mul(r + 1) <= v {
        r += 1;
    }
    Coord::try_from(r).unwrap_or(Coord::MAX)
}

/// 两点之差 `a - b`（扩展精度，任意坐标都不会溢出）
#[inline]
pub fn wide_delta(a: &Point2I, b: &Point2I) -> Vector2E {
    Vector2E::new(
        ECoord::from(a.x) - ECoord::from(b.x),
        ECoord::from(a.y) - ECoord::from(b.y),
    )
}

/// 两点之间的平方距离（超出 `ECoord` 时饱和）
#[inline]
pub fn squared_distance(a: &Point2I, b: &Point2I) -> ECoord {
    wide_delta(a, b).squared_len()
}

/// 两点中点
#[inline]
pub fn midpoint(a: &Point2I, b: &Point2I) -> Point2I {
    Point2I::new(
        ((ECoord::from(a.x) + ECoord::from(b.x)) / 2) as Coord,
        ((ECoord::from(a.y) + ECoord::from(b.y)) / 2) as Coord,
    )
}

/// 平移一个点，结果饱和到坐标范围
#[inline]
pub fn translate(p: &Point2I, v: &Vector2I) -> Point2I {
    Point2I::new(p.x.saturating_add(v.x), p.y.saturating_add(v.y))
}

/// 扩展精度向量饱和到坐标向量
#[inline]
pub fn saturate(v: &Vector2E) -> Vector2I {
    Vector2I::new(clamp_coord(v.x), clamp_coord(v.y))
}

/// 向量的扩展精度运算
///
/// 坐标向量 [`Vector2I`] 和两点之差 [`Vector2E`] 都实现了它；
/// 点积、叉积使用128位，任意坐标下都是精确值。
pub trait VectorExt {
    /// 扩展精度分量
    fn widen(&self) -> Vector2E;

    /// 平方长度（超出 `ECoord` 时饱和）
    fn squared_len(&self) -> ECoord {
        ECoord::try_from(self.wide_dot(&self.widen())).unwrap_or(ECOORD_MAX)
    }

    /// 长度（截断到整数）
    fn int_len(&self) -> Coord {
        isqrt(self.squared_len())
    }

    /// 点积
    fn wide_dot(&self, other: &Vector2E) -> i128 {
        let a = self.widen();
        i128::from(a.x) * i128::from(other.x) + i128::from(a.y) * i128::from(other.y)
    }

    /// 叉积 `self.x * other.y - self.y * other.x`
    fn wide_cross(&self, other: &Vector2E) -> i128 {
        let a = self.widen();
        i128::from(a.x) * i128::from(other.y) - i128::from(a.y) * i128::from(other.x)
    }

    /// 保持方向缩放到指定长度；负长度反向，零向量保持为零
    fn with_length(&self, len: Coord) -> Vector2I {
        let v = self.widen();
        if v.x == 0 && v.y == 0 {
            return Vector2I::zeros();
        }

        let current_sq = self.wide_dot(&v);
        let new_sq = i128::from(len) * i128::from(len);

        let component = |c: ECoord| -> Coord {
            let c_sq = i128::from(c) * i128::from(c);
            let magnitude = (rescale(new_sq, c_sq, current_sq) as f64).sqrt() as Coord;
            if c < 0 {
                -magnitude
            } else {
                magnitude
            }
        };

        let sign = if len < 0 { -1 } else { 1 };
        Vector2I::new(component(v.x) * sign, component(v.y) * sign)
    }

    /// 绕原点旋转（弧度），结果四舍五入
    fn rotated(&self, angle: f64) -> Vector2I {
        let v = self.widen();
        if angle == 0.0 {
            return saturate(&v);
        }
        let r = na::Rotation2::new(angle) * Vector2::new(v.x as f64, v.y as f64);
        Vector2I::new(round_coord(r.x), round_coord(r.y))
    }
}

impl VectorExt for Vector2I {
    #[inline]
    fn widen(&self) -> Vector2E {
        Vector2E::new(ECoord::from(self.x), ECoord::from(self.y))
    }
}

impl VectorExt for Vector2E {
    #[inline]
    fn widen(&self) -> Vector2E {
        *self
    }
}

/// 将向量捕捉到水平、垂直或45°方向
///
/// 分量比超过 2:1 时捕捉到坐标轴，否则捕捉到对角线（保留较大分量的长度）。
pub fn snapped_45(v: Vector2I) -> Vector2I {
    let ax = v.x.abs();
    let ay = v.y.abs();
    let signed = |magnitude: Coord, sign_of: Coord| if sign_of < 0 { -magnitude } else { magnitude };

    if ax > ay.saturating_mul(2) {
        Vector2I::new(v.x, 0)
    } else if ay > ax.saturating_mul(2) {
        Vector2I::new(0, v.y)
    } else if ax > ay {
        Vector2I::new(v.x, signed(ax, v.y))
    } else {
        Vector2I::new(signed(ay, v.x), v.y)
    }
}

/// 2D整数包围盒（闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox2I {
    pub min: Point2I,
    pub max: Point2I,
}

impl BoundingBox2I {
    /// 创建新的包围盒
    pub fn new(min: Point2I, max: Point2I) -> Self {
        Self { min, max }
    }

    /// 创建空的包围盒（无效状态）
    pub fn empty() -> Self {
        Self {
            min: Point2I::new(Coord::MAX, Coord::MAX),
            max: Point2I::new(Coord::MIN, Coord::MIN),
        }
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// 从点集创建包围盒
    pub fn from_points(points: impl IntoIterator<Item = Point2I>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.expand_to_include(&p);
        }
        bbox
    }

    /// 扩展包围盒以包含指定点
    pub fn expand_to_include(&mut self, point: &Point2I) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// 合并两个包围盒
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Point2I::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2I::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// 向四周扩大指定距离
    pub fn inflate(&self, amount: Coord) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self {
            min: Point2I::new(self.min.x.saturating_sub(amount), self.min.y.saturating_sub(amount)),
            max: Point2I::new(self.max.x.saturating_add(amount), self.max.y.saturating_add(amount)),
        }
    }

    /// 检查是否与另一个包围盒相交
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// 检查是否包含指定点（边界上也算包含）
    pub fn contains(&self, point: &Point2I) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// 获取中心点
    pub fn center(&self) -> Point2I {
        Point2I::new(
            ((ECoord::from(self.min.x) + ECoord::from(self.max.x)) / 2) as Coord,
            ((ECoord::from(self.min.y) + ECoord::from(self.max.y)) / 2) as Coord,
        )
    }

    /// 获取宽度
    pub fn width(&self) -> ECoord {
        ECoord::from(self.max.x) - ECoord::from(self.min.x)
    }

    /// 获取高度
    pub fn height(&self) -> ECoord {
        ECoord::from(self.max.y) - ECoord::from(self.min.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let bbox = BoundingBox2I::from_points([
            Point2I::new(0, 0),
            Point2I::new(10, 5),
            Point2I::new(-5, 8),
        ]);

        assert_eq!(bbox.min, Point2I::new(-5, 0));
        assert_eq!(bbox.max, Point2I::new(10, 8));
        assert!(bbox.contains(&Point2I::new(0, 4)));
        assert!(bbox.contains(&Point2I::new(10, 8)));
        assert!(!bbox.contains(&Point2I::new(20, 4)));
        assert_eq!(bbox.inflate(2).min, Point2I::new(-7, -2));
        assert_eq!((bbox.width(), bbox.height()), (15, 8));
        assert!(BoundingBox2I::empty().is_empty());

        let huge = BoundingBox2I::new(Point2I::new(Coord::MIN, 0), Point2I::new(Coord::MAX, 0));
        assert_eq!(huge.width(), ECoord::from(u32::MAX));
        assert_eq!(huge.center(), Point2I::new(0, 0));
    }

    #[test]
    fn test_wide_delta() {
        let a = Point2I::new(2_000_000_000, -2_000_000_000);
        let b = Point2I::new(-2_000_000_000, 2_000_000_000);

        let d = wide_delta(&a, &b);
        assert_eq!(d, Vector2E::new(4_000_000_000, -4_000_000_000));
        assert_eq!(d.wide_dot(&d), 32_000_000_000_000_000_000);
        assert_eq!(d.wide_cross(&Vector2E::new(1, 1)), 8_000_000_000);

        // 平方长度饱和，长度饱和到坐标上限
        assert_eq!(squared_distance(&a, &b), ECOORD_MAX);
        assert_eq!(d.int_len(), Coord::MAX);
        assert_eq!(d.with_length(10), Vector2I::new(7, -7));

        assert_eq!(midpoint(&a, &b), Point2I::new(0, 0));
        assert_eq!(
            translate(&a, &Vector2I::new(Coord::MAX, 1)),
            Point2I::new(Coord::MAX, -1_999_999_999)
        );
        assert_eq!(saturate(&d), Vector2I::new(Coord::MAX, Coord::MIN));
        assert_eq!(clamp_coord(-5_000_000_000i64), Coord::MIN);
    }

    #[test]
    fn test_rescale_rounding() {
        assert_eq!(rescale(1, 5, 2), 3);
        assert_eq!(rescale(-1, 5, 2), -3);
        assert_eq!(rescale(2, 3, 4), 2);
        assert_eq!(rescale(i64::MAX, 2, 4), i64::MAX / 2 + 1);
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(15), 3);
        assert_eq!(isqrt(16), 4);
        assert_eq!(isqrt(-4), 0);
        assert_eq!(isqrt(4_000_000_000_000_000_000), 2_000_000_000);
    }

    #[test]
    fn test_with_length() {
        assert_eq!(Vector2I::new(8, 0).with_length(5), Vector2I::new(5, 0));
        assert_eq!(Vector2I::new(-3, 4).with_length(10), Vector2I::new(-6, 8));
        assert_eq!(Vector2I::new(3, 4).with_length(-10), Vector2I::new(-6, -8));
        assert_eq!(Vector2I::zeros().with_length(10), Vector2I::zeros());
        // 方向取反与长度取反一致
        let v = Vector2I::new(7, -13);
        assert_eq!((-v).with_length(9), -v.with_length(9));
    }

    #[test]
    fn test_rotated() {
        assert_eq!(
            Vector2I::new(10, 0).rotated(std::f64::consts::FRAC_PI_2),
            Vector2I::new(0, 10)
        );
        assert_eq!(
            Vector2I::new(100, 0).rotated(std::f64::consts::FRAC_PI_4),
            Vector2I::new(71, 71)
        );
    }

    #[test]
    fn test_snapped_45() {
        assert_eq!(snapped_45(Vector2I::new(10, 2)), Vector2I::new(10, 0));
        assert_eq!(snapped_45(Vector2I::new(-1, -9)), Vector2I::new(0, -9));
        assert_eq!(snapped_45(Vector2I::new(10, -7)), Vector2I::new(10, -10));
        assert_eq!(snapped_45(Vector2I::new(-6, 8)), Vector2I::new(-8, 8));
        assert_eq!(snapped_45(Vector2I::new(0, 0)), Vector2I::new(0, 0));
    }
}
