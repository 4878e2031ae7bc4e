// mesh.rs — inward-facing UV sphere for the panorama

use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone)]
pub struct SphereMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// `width_segments` around the equator, `height_segments` pole to pole.
///
/// Azimuth runs from +X towards +Z so that u = 0.5 lies on -X, matching the
/// camera convention (yaw 0 looks down -X). v = 0 is the top row of the image.
/// Triangles are wound so their front faces point at the centre.
pub fn build_sphere(radius: f32, width_segments: usize, height_segments: usize) -> SphereMesh {
    let w = width_segments.max(3);
    let h = height_segments.max(2);
    let mut vertices = Vec::with_capacity((w + 1) * (h + 1));
    let mut indices = Vec::with_capacity(w * h * 6);

    for i in 0..=h {
        let v = i as f32 / h as f32;
        let polar = std::f32::consts::PI * v;
        let y = radius * polar.cos();
        let ring = radius * polar.sin();

        for j in 0..=w {
            let u = j as f32 / w as f32;
            let azimuth = 2.0 * std::f32::consts::PI * u;
            vertices.push(Vertex {
                position: [ring * azimuth.cos(), y, ring * azimuth.sin()],
                uv: [u, v],
            });
        }
    }

    let stride = (w + 1) as u32;
    for i in 0..h as u32 {
        for j in 0..w as u32 {
            let a = i * stride + j;
            let b = a + stride;
            if i != 0 {
                indices.extend_from_slice(&[a, b, a + 1]);
            }
            if i != h as u32 - 1 {
                indices.extend_from_slice(&[a + 1, b, b + 1]);
            }
        }
    }

    SphereMesh { vertices, indices }
}
