use crate::camera::FlyCamera;
use crate::mesh::{self, GpuMesh, Vertex};
use crate::shaders;
use crate::texture::{DEPTH_FORMAT, GpuTexture};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use heavens_assets::{CubemapImage, TextureImage};
use heavens_common::Transform;
use wgpu::util::DeviceExt;

/// Floor, cubes and sphere share one instance buffer of this many slots.
const MAX_INSTANCES: usize = 64;
const SPHERE_SEGMENTS: u16 = 32;
const SPHERE_RINGS: u16 = 16;
/// How much of the overlay texture shows through on the floor.
const FLOOR_OVERLAY_MIX: f32 = 0.2;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct MaterialUniform {
    tint: [f32; 4],
    mix_factor: f32,
    _padding: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model: [[f32; 4]; 4],
}

impl InstanceData {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
    ];

    fn from_transform(t: &Transform) -> Self {
        Self {
            model: t.matrix().to_cols_array_2d(),
        }
    }
}

/// Decoded images the renderer needs at startup.
pub struct SceneTextures {
    /// Surface texture for the floor and cubes.
    pub container: TextureImage,
    /// Blended over the floor, and wrapped around the sphere.
    pub overlay: TextureImage,
    pub skybox: CubemapImage,
}

/// Everything that changes between frames.
#[derive(Debug, Clone)]
pub struct FrameScene {
    /// Linear RGBA the framebuffer is cleared to.
    pub clear_color: [f32; 4],
    pub floor: Transform,
    pub cubes: Vec<Transform>,
    pub sphere: Option<Transform>,
}

struct Material {
    bind_group: wgpu::BindGroup,
}

/// Draws the fixed demo scene.
pub struct SceneRenderer {
    scene_pipeline: wgpu::RenderPipeline,
    skybox_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    sky_camera_buffer: wgpu::Buffer,
    sky_bind_group: wgpu::BindGroup,
    floor_material: Material,
    cube_material: Material,
    sphere_material: Material,
    plane: GpuMesh,
    cube: GpuMesh,
    sphere: GpuMesh,
    skybox_vertex_buffer: wgpu::Buffer,
    skybox_vertex_count: u32,
    instance_buffer: wgpu::Buffer,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        textures: &SceneTextures,
    ) -> Self {
        // Camera
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_buffer"),
            contents: bytemuck::bytes_of(&CameraUniform {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera_bind_group_layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bind_group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        // Materials
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_bind_group_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                texture_entry(1, wgpu::TextureViewDimension::D2),
                sampler_entry(2),
                texture_entry(3, wgpu::TextureViewDimension::D2),
                sampler_entry(4),
            ],
        });

        let container =
            GpuTexture::from_image(device, queue, "container_texture", &textures.container);
        let overlay = GpuTexture::from_image(device, queue, "overlay_texture", &textures.overlay);

        let floor_material = create_material(
            device,
            &material_layout,
            "floor_material",
            (&container, &overlay),
            [1.0; 4],
            FLOOR_OVERLAY_MIX,
        );
        let cube_material = create_material(
            device,
            &material_layout,
            "cube_material",
            (&container, &container),
            [1.0; 4],
            0.0,
        );
        let sphere_material = create_material(
            device,
            &material_layout,
            "sphere_material",
            (&overlay, &overlay),
            [1.0, 0.9, 0.75, 1.0],
            0.0,
        );

        // Scene pipeline
        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });

        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&camera_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let scene_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene_pipeline"),
            layout: Some(&scene_layout),
            vertex: wgpu::VertexState {
                module: &scene_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    Vertex::layout(),
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &InstanceData::ATTRIBUTES,
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &scene_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Skybox
        let sky_camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sky_camera_buffer"),
            contents: bytemuck::bytes_of(&CameraUniform {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let sky_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sky_bind_group_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX),
                texture_entry(1, wgpu::TextureViewDimension::Cube),
                sampler_entry(2),
            ],
        });

        let sky_texture = GpuTexture::cubemap(device, queue, "skybox_texture", &textures.skybox);
        let sky_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sky_bind_group"),
            layout: &sky_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: sky_camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&sky_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sky_texture.sampler),
                },
            ],
        });

        let sky_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("skybox_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SKYBOX_SHADER.into()),
        });

        let sky_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("skybox_pipeline_layout"),
            bind_group_layouts: &[&sky_layout],
            push_constant_ranges: &[],
        });

        let skybox_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("skybox_pipeline"),
            layout: Some(&sky_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &sky_shader,
                entry_point: Some("vs_sky"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &sky_shader,
                entry_point: Some("fs_sky"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Meshes
        let plane = GpuMesh::upload(device, "plane", &mesh::plane());
        let cube = GpuMesh::upload(device, "cube", &mesh::cube());
        let sphere = GpuMesh::upload(
            device,
            "sphere",
            &mesh::uv_sphere(1.0, SPHERE_SEGMENTS, SPHERE_RINGS),
        );
        let skybox_positions = mesh::skybox();
        let skybox_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("skybox_vertex_buffer"),
            contents: bytemuck::cast_slice(&skybox_positions),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: (MAX_INSTANCES * std::mem::size_of::<InstanceData>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_texture = GpuTexture::depth(device, width, height);

        tracing::info!("scene renderer ready ({surface_format:?})");

        Self {
            scene_pipeline,
            skybox_pipeline,
            camera_buffer,
            camera_bind_group,
            sky_camera_buffer,
            sky_bind_group,
            floor_material,
            cube_material,
            sphere_material,
            plane,
            cube,
            sphere,
            skybox_vertex_buffer,
            skybox_vertex_count: skybox_positions.len() as u32,
            instance_buffer,
            depth_texture,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = GpuTexture::depth(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Render one frame: floor, cubes, sphere, then the sky behind them.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &FlyCamera,
        scene: &FrameScene,
    ) {
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform {
                view_proj: camera.view_projection().to_cols_array_2d(),
            }),
        );
        queue.write_buffer(
            &self.sky_camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform {
                view_proj: camera.skybox_view_projection().to_cols_array_2d(),
            }),
        );

        // Slot 0 is the floor, then the cubes, then the sphere.
        let cube_capacity = MAX_INSTANCES - 2;
        if scene.cubes.len() > cube_capacity {
            tracing::warn!(
                "{} cubes requested, drawing the first {cube_capacity}",
                scene.cubes.len()
            );
        }
        let cubes = &scene.cubes[..scene.cubes.len().min(cube_capacity)];

        let mut instances = Vec::with_capacity(cubes.len() + 2);
        instances.push(InstanceData::from_transform(&scene.floor));
        instances.extend(cubes.iter().map(InstanceData::from_transform));
        let sphere_slot = instances.len();
        if let Some(sphere) = &scene.sphere {
            instances.push(InstanceData::from_transform(sphere));
        }
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let [r, g, b, a] = scene.clear_color.map(f64::from);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&self.scene_pipeline);
            pass.set_bind_group(0, &self.camera_bind_group, &[]);

            // Floor
            self.draw_instances(&mut pass, &self.plane, &self.floor_material, 0, 1);

            // Cubes
            if !cubes.is_empty() {
                self.draw_instances(&mut pass, &self.cube, &self.cube_material, 1, cubes.len());
            }

            // Sphere
            if scene.sphere.is_some() {
                self.draw_instances(&mut pass, &self.sphere, &self.sphere_material, sphere_slot, 1);
            }

            // Sky last: it only fills pixels still at the far plane.
            pass.set_pipeline(&self.skybox_pipeline);
            pass.set_bind_group(0, &self.sky_bind_group, &[]);
            pass.set_vertex_buffer(0, self.skybox_vertex_buffer.slice(..));
            pass.draw(0..self.skybox_vertex_count, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn draw_instances(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        mesh: &GpuMesh,
        material: &Material,
        first: usize,
        count: usize,
    ) {
        let stride = std::mem::size_of::<InstanceData>() as u64;
        let start = first as u64 * stride;
        let end = start + count as u64 * stride;
        pass.set_bind_group(1, &material.bind_group, &[]);
        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, self.instance_buffer.slice(start..end));
        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..mesh.index_count, 0, 0..count as u32);
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(
    binding: u32,
    view_dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn create_material(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    (a, b): (&GpuTexture, &GpuTexture),
    tint: [f32; 4],
    mix_factor: f32,
) -> Material {
    let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(&MaterialUniform {
            tint,
            mix_factor,
            _padding: [0.0; 3],
        }),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&a.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&a.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(&b.view),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::Sampler(&b.sampler),
            },
        ],
    });
    Material { bind_group }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn uniform_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
        // vec4 + f32, rounded up to the struct's 16-byte alignment.
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 32);
        assert_eq!(std::mem::size_of::<InstanceData>(), 64);
    }

    #[test]
    fn instance_columns_follow_transform() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(Quat::from_rotation_y(0.5))
            .with_scale(Vec3::splat(2.0));
        let data = InstanceData::from_transform(&t);
        assert_eq!(data.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(Mat4::from_cols_array_2d(&data.model), t.matrix());
    }
}
