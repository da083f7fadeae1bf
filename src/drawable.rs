//! The capability shared by everything the scene draws.

use crate::assets::Assets;
use crate::camera::Camera;
use crate::graphics::GraphicsContext;
use crate::mesh::Mesh;

/// Something that can bind its shaders, upload its uniforms and submit its
/// geometry for the given camera.
pub trait Drawable {
    fn draw(&mut self, ctx: &mut dyn GraphicsContext, camera: &Camera, assets: &Assets);
}

/// Bind `mesh`'s buffers and draw all of its indices.
pub fn submit_indexed(ctx: &mut dyn GraphicsContext, mesh: &Mesh) {
    ctx.set_vertex_buffer(mesh.vertex_buffer(), mesh.stride());
    ctx.set_index_buffer(mesh.index_buffer());
    ctx.draw_indexed(mesh.index_count(), 0, 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshData;
    use crate::recording::{GpuCall, RecordingContext};

    #[test]
    fn submits_every_index_from_the_start() {
        let mut ctx = RecordingContext::new();
        let mesh = Mesh::new(&mut ctx, &MeshData::cube()).unwrap();
        ctx.clear_calls();

        submit_indexed(&mut ctx, &mesh);

        assert_eq!(
            ctx.calls(),
            &[
                GpuCall::SetVertexBuffer {
                    buffer: mesh.vertex_buffer(),
                    stride: mesh.stride(),
                },
                GpuCall::SetIndexBuffer(mesh.index_buffer()),
                GpuCall::DrawIndexed {
                    index_count: mesh.index_count(),
                    start_index: 0,
                    base_vertex: 0,
                },
            ]
        );
    }
}
