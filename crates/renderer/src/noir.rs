//! CPU mirror of the smoke fragment program.
//!
//! Every step follows [`crate::shader::SMOKE_FRAGMENT_GLSL`] line for line,
//! in `f32`, so still exports and tests see the same image the GPU draws
//! (modulo driver rounding of `sin`).

type Vec2 = [f32; 2];
type Vec3 = [f32; 3];

const SIMPLEX_C: [f32; 4] = [
    0.211_324_87,
    0.366_025_42,
    -0.577_350_26,
    0.024_390_243,
];

const COLOR_BLACK: Vec3 = [0.02, 0.02, 0.02];
const COLOR_GREY: Vec3 = [0.15, 0.15, 0.16];
const COLOR_HIGHLIGHT: Vec3 = [0.1, 0.1, 0.12];

pub const BLACK: Vec3 = [0.0, 0.0, 0.0];

/// Uniform inputs of the smoke program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmokeInputs {
    /// Elapsed seconds.
    pub time: f32,
    /// Render resolution in pixels.
    pub resolution: Vec2,
    /// Smoothed pointer, normalised with a bottom-left origin.
    pub mouse: Vec2,
}

impl SmokeInputs {
    pub fn new(time: f32, resolution: Vec2, mouse: Vec2) -> Self {
        Self {
            time,
            resolution,
            mouse,
        }
    }
}

/// Colour of the fragment at `frag_coord` (pixel centre, bottom-left origin).
pub fn shade(frag_coord: Vec2, inputs: &SmokeInputs) -> Vec3 {
    let [res_x, res_y] = inputs.resolution;
    if !(res_x > 0.0 && res_y > 0.0) {
        return BLACK;
    }

    let aspect = res_x / res_y;
    let st = [frag_coord[0] / res_x * aspect, frag_coord[1] / res_y];

    let mouse = [inputs.mouse[0] * aspect, inputs.mouse[1] * aspect];
    let mouse_dist = length(sub2(st, mouse));

    let t = inputs.time;
    let q = [fbm(add2s(st, 0.1 * t)), fbm(add2s(st, 1.0))];

    let warped = add2(st, q);
    let r = [
        fbm(add2s(add2(warped, [1.7, 9.2]), 0.15 * t)),
        fbm(add2s(add2(warped, [8.3, 2.8]), 0.126 * t)),
    ];

    let f = fbm(add2(st, r));

    let mut color = mix3(COLOR_BLACK, COLOR_GREY, (f * f * 4.0).clamp(0.0, 1.0));
    color = mix3(color, COLOR_HIGHLIGHT, length(q).clamp(0.0, 1.0));
    color = add3s(color, r[1] * 0.05);

    let grain = random([st[0] * t, st[1] * t]);
    color = add3s(color, (grain - 0.5) * 0.08);

    let interaction = 1.0 - smoothstep(0.0, 0.5, mouse_dist);
    color = add3s(color, 0.05 * interaction);

    if color.iter().all(|channel| channel.is_finite()) {
        color
    } else {
        BLACK
    }
}

/// 2-D simplex noise, roughly in `[-1, 1]`.
pub fn snoise(v: Vec2) -> f32 {
    let c = SIMPLEX_C;
    let skew = (v[0] + v[1]) * c[1];
    let i = [(v[0] + skew).floor(), (v[1] + skew).floor()];
    let unskew = (i[0] + i[1]) * c[0];
    let x0 = [v[0] - i[0] + unskew, v[1] - i[1] + unskew];

    let i1: Vec2 = if x0[0] > x0[1] { [1.0, 0.0] } else { [0.0, 1.0] };
    let x12 = [
        x0[0] + c[0] - i1[0],
        x0[1] + c[0] - i1[1],
        x0[0] + c[2],
        x0[1] + c[2],
    ];

    let i = [glsl_mod(i[0], 289.0), glsl_mod(i[1], 289.0)];
    let inner = [
        permute(i[1]),
        permute(i[1] + i1[1]),
        permute(i[1] + 1.0),
    ];
    let p = [
        permute(inner[0] + i[0]),
        permute(inner[1] + i[0] + i1[0]),
        permute(inner[2] + i[0] + 1.0),
    ];

    let mut m = [
        (0.5 - (x0[0] * x0[0] + x0[1] * x0[1])).max(0.0),
        (0.5 - (x12[0] * x12[0] + x12[1] * x12[1])).max(0.0),
        (0.5 - (x12[2] * x12[2] + x12[3] * x12[3])).max(0.0),
    ];
    for value in &mut m {
        *value *= *value;
        *value *= *value;
    }

    let x = p.map(|value| 2.0 * fract(value * c[3]) - 1.0);
    let h = x.map(|value| value.abs() - 0.5);
    let a0 = x.map(|value| value - (value + 0.5).floor());

    for k in 0..3 {
        m[k] *= 1.792_842_9 - 0.853_734_7 * (a0[k] * a0[k] + h[k] * h[k]);
    }

    let g = [
        a0[0] * x0[0] + h[0] * x0[1],
        a0[1] * x12[0] + h[1] * x12[1],
        a0[2] * x12[2] + h[2] * x12[3],
    ];

    130.0 * (m[0] * g[0] + m[1] * g[1] + m[2] * g[2])
}

/// Three octaves of simplex noise.
pub fn fbm(mut p: Vec2) -> f32 {
    let mut value = 0.0;
    let mut amplitude = 0.5;
    for _ in 0..3 {
        value += amplitude * snoise(p);
        p = [p[0] * 2.0, p[1] * 2.0];
        amplitude *= 0.5;
    }
    value
}

/// Hash used for film grain.
pub fn random(st: Vec2) -> f32 {
    fract((st[0] * 12.9898 + st[1] * 78.233).sin() * 43_758.545_3)
}

fn permute(x: f32) -> f32 {
    glsl_mod(((x * 34.0) + 1.0) * x, 289.0)
}

fn glsl_mod(x: f32, y: f32) -> f32 {
    x - y * (x / y).floor()
}

fn fract(x: f32) -> f32 {
    x - x.floor()
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn length(v: Vec2) -> f32 {
    (v[0] * v[0] + v[1] * v[1]).sqrt()
}

fn add2(a: Vec2, b: Vec2) -> Vec2 {
    [a[0] + b[0], a[1] + b[1]]
}

fn sub2(a: Vec2, b: Vec2) -> Vec2 {
    [a[0] - b[0], a[1] - b[1]]
}

fn add2s(a: Vec2, s: f32) -> Vec2 {
    [a[0] + s, a[1] + s]
}

fn add3s(a: Vec3, s: f32) -> Vec3 {
    [a[0] + s, a[1] + s, a[2] + s]
}

fn mix3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(time: f32) -> SmokeInputs {
        SmokeInputs::new(time, [1280.0, 720.0], [0.5, 0.5])
    }

    #[test]
    fn shading_is_deterministic() {
        for &time in &[0.0, 1.5, 42.0, 1234.5] {
            for &coord in &[[0.5, 0.5], [640.5, 360.5], [1279.5, 719.5]] {
                let first = shade(coord, &inputs(time));
                let second = shade(coord, &inputs(time));
                assert_eq!(first.map(f32::to_bits), second.map(f32::to_bits));
            }
        }
    }

    #[test]
    fn zero_resolution_renders_black() {
        let degenerate = SmokeInputs::new(3.0, [0.0, 0.0], [0.5, 0.5]);
        assert_eq!(shade([10.0, 10.0], &degenerate), BLACK);
        let flat = SmokeInputs::new(3.0, [1280.0, 0.0], [0.5, 0.5]);
        assert_eq!(shade([10.0, 10.0], &flat), BLACK);
        let negative = SmokeInputs::new(3.0, [-5.0, 720.0], [0.5, 0.5]);
        assert_eq!(shade([10.0, 10.0], &negative), BLACK);
    }

    #[test]
    fn smoke_animates_over_time() {
        let coord = [400.5, 300.5];
        let early = shade(coord, &inputs(0.0));
        let late = shade(coord, &inputs(10.0));
        assert_ne!(early, late);
    }

    #[test]
    fn pointer_brightens_nearby_fragments() {
        let coord = [640.5, 360.5];
        let aspect = 1280.0 / 720.0;
        // Pointer placed exactly over the fragment in aspect-corrected space.
        let st = [coord[0] / 1280.0 * aspect, coord[1] / 720.0];
        let near = SmokeInputs::new(2.0, [1280.0, 720.0], [st[0] / aspect, st[1] / aspect]);
        let far = SmokeInputs::new(2.0, [1280.0, 720.0], [-5.0, -5.0]);
        let lit = shade(coord, &near);
        let unlit = shade(coord, &far);
        for channel in 0..3 {
            assert!((lit[channel] - unlit[channel] - 0.05).abs() < 1e-4);
        }
    }

    #[test]
    fn palette_stays_near_black() {
        for y in 0..8 {
            for x in 0..8 {
                let coord = [x as f32 * 160.0 + 0.5, y as f32 * 90.0 + 0.5];
                let color = shade(coord, &inputs(7.25));
                for channel in color {
                    assert!(channel > -0.2 && channel < 0.5, "unexpected channel {channel}");
                }
            }
        }
    }

    #[test]
    fn simplex_noise_is_bounded() {
        for y in -20..20 {
            for x in -20..20 {
                let value = snoise([x as f32 * 0.37, y as f32 * 0.53]);
                assert!(value.abs() <= 1.01, "noise {value} out of range");
            }
        }
    }

    #[test]
    fn grain_hash_is_unit_interval() {
        for step in 0..100 {
            let value = random([step as f32 * 0.13, step as f32 * 0.71]);
            assert!((0.0..1.0).contains(&value));
        }
        assert_eq!(random([0.0, 0.0]), 0.0);
    }

    #[test]
    fn grain_hash_uses_glsl_constant() {
        let st = [0.37_f32, 0.91_f32];
        let scaled = (st[0] * 12.9898 + st[1] * 78.233).sin() * 43_758.545_312_3_f32;
        assert_eq!(random(st), scaled - scaled.floor());
    }
}
