use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use relight::{relight, ColorParams, ImageSurface, LightVector, NormalMap, ShadingParams};

const SURFACE_SIDE: usize = 512;

fn gray_image(side: usize) -> ImageSurface {
    ImageSurface::from_raw(1, side, side, 3, vec![0.5; side * side * 3]).unwrap()
}

fn sloped_normals(side: usize) -> NormalMap {
    let mut data = Vec::with_capacity(side * side * 3);
    for y in 0..side {
        for x in 0..side {
            data.push(x as f32 / side as f32);
            data.push(y as f32 / side as f32);
            data.push(1.0);
        }
    }

    NormalMap::new(ImageSurface::from_raw(1, side, side, 3, data).unwrap()).unwrap()
}

fn bench_lighting(c: &mut Criterion) {
    c.bench_function("relight defaults", |b| {
        let image = gray_image(SURFACE_SIDE);
        let normals = sloped_normals(SURFACE_SIDE);
        let light = black_box(LightVector::from_screen(0.25, 0.3, 1.0));

        b.iter(|| {
            relight(
                &image,
                &normals,
                light,
                &ShadingParams::default(),
                &ColorParams::default(),
            )
            .unwrap()
        })
    });

    c.bench_function("relight shaped and tinted", |b| {
        let image = gray_image(SURFACE_SIDE);
        let normals = sloped_normals(SURFACE_SIDE);
        let light = black_box(LightVector::from_screen(0.25, 0.3, 1.0));

        let shading = ShadingParams {
            brightness: 1.2,
            shadow_strength: 1.6,
            highlight_strength: 1.3,
            ..ShadingParams::default()
        };
        let color = ColorParams::from_css("#fff0dc", "#1e2846").unwrap();

        b.iter(|| relight(&image, &normals, light, &shading, &color).unwrap())
    });
}

criterion_group!(benches, bench_lighting);
criterion_main!(benches);
