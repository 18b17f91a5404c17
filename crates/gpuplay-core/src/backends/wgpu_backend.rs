//! WebGPU Backend - Compute Shaders via wgpu
//!
//! Buffers live in GPU storage buffers. Every operation records one compute
//! pass and submits it to the queue without waiting; `cpu()` and `sync()` are
//! the only calls that block on the device.
//!
//! # Key Features
//! - Cross-platform support (Vulkan, Metal, DX12, GL)
//! - WGSL kernels compiled once and cached per device
//! - Staging-buffer readback
//!
//! # Requirements
//! - The `wgpu` feature
//! - A wgpu-compatible adapter at runtime
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use wgpu::util::DeviceExt;
use wgpu::{
    BufferUsages, CommandEncoderDescriptor, ComputePipeline, ComputePipelineDescriptor,
    DeviceDescriptor, Features, Instance, InstanceDescriptor, Limits, MapMode, Queue,
    ShaderModuleDescriptor, ShaderSource,
};

use crate::buffer::Buffer;
use crate::compat;
use crate::device::{Device, DeviceType};
use crate::error::{Error, Result};
use crate::shape::Shape;
use crate::tolerance::Tolerance;

const DEVICE: DeviceType = DeviceType::Wgpu;
const WORKGROUP_SIZE: usize = 256;
const F32_BYTES: u64 = 4;

// =============================================================================
// GPU Buffer
// =============================================================================

/// Storage buffer of the wgpu backend.
#[derive(Debug)]
pub struct GpuBuffer {
    buffer: wgpu::Buffer,
    len: usize,
}

impl GpuBuffer {
    fn byte_size(&self) -> u64 {
        self.len as u64 * F32_BYTES
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        self.buffer.destroy();
    }
}

fn gpu(buffer: &Buffer) -> Result<&GpuBuffer> {
    buffer.handle::<GpuBuffer>(DEVICE)
}

fn gpu_mut(buffer: &mut Buffer) -> Result<&mut GpuBuffer> {
    buffer.handle_mut::<GpuBuffer>(DEVICE)
}

// =============================================================================
// WebGPU Device
// =============================================================================

/// Backend running WGSL compute shaders through wgpu.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: Queue,
    adapter_info: wgpu::AdapterInfo,
    pipelines: Mutex<HashMap<&'static str, Arc<ComputePipeline>>>,
}

impl std::fmt::Debug for WgpuDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuDevice")
            .field("adapter", &self.adapter_info.name)
            .field("backend", &self.adapter_info.backend)
            .finish_non_exhaustive()
    }
}

impl WgpuDevice {
    /// Requests the default high-performance adapter and opens a device on it.
    pub fn new() -> Result<Self> {
        let instance = Instance::new(InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| Error::unavailable(DEVICE, "no compatible adapter found"))?;
        let adapter_info = adapter.get_info();

        let (device, queue) = pollster::block_on(adapter.request_device(
            &DeviceDescriptor {
                label: Some("gpuplay wgpu device"),
                required_features: Features::empty(),
                required_limits: Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))
        .map_err(|e| Error::unavailable(DEVICE, e.to_string()))?;

        Ok(Self {
            device,
            queue,
            adapter_info,
            pipelines: Mutex::new(HashMap::new()),
        })
    }

    /// Information about the adapter backing this device.
    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    fn pipeline(&self, name: &'static str, wgsl: &str) -> Arc<ComputePipeline> {
        let mut pipelines = self.pipelines.lock();
        pipelines
            .entry(name)
            .or_insert_with(|| {
                let module = self.device.create_shader_module(ShaderModuleDescriptor {
                    label: Some(name),
                    source: ShaderSource::Wgsl(wgsl.into()),
                });
                Arc::new(
                    self.device
                        .create_compute_pipeline(&ComputePipelineDescriptor {
                            label: Some(name),
                            layout: None,
                            module: &module,
                            entry_point: Some("main"),
                            compilation_options: wgpu::PipelineCompilationOptions::default(),
                            cache: None,
                        }),
                )
            })
            .clone()
    }

    fn dims_uniform(&self, dims: [u32; 4]) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("dims"),
                contents: bytemuck::cast_slice(&dims),
                usage: BufferUsages::UNIFORM,
            })
    }

    fn grid(&self, count: usize) -> Result<(u32, u32)> {
        dispatch_grid(count, self.device.limits().max_compute_workgroups_per_dimension)
    }

    /// Records and submits one compute pass binding `buffers` in order.
    fn dispatch(
        &self,
        name: &'static str,
        wgsl: &str,
        buffers: &[&wgpu::Buffer],
        workgroups: (u32, u32),
    ) {
        let pipeline = self.pipeline(name, wgsl);
        let layout = pipeline.get_bind_group_layout(0);
        let entries: Vec<wgpu::BindGroupEntry<'_>> = buffers
            .iter()
            .enumerate()
            .map(|(binding, buffer)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: buffer.as_entire_binding(),
            })
            .collect();
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(name),
            layout: &layout,
            entries: &entries,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor { label: Some(name) });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(name),
                timestamp_writes: None,
            });
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(workgroups.0, workgroups.1, 1);
        }
        self.queue.submit(Some(encoder.finish()));
    }

    fn binary(
        &self,
        name: &'static str,
        wgsl: &str,
        a: &Buffer,
        b: &Buffer,
        out: &mut Buffer,
    ) -> Result<()> {
        let grid = self.grid(out.size())?;
        let (a, b, out) = (gpu(a)?, gpu(b)?, gpu_mut(out)?);
        self.dispatch(name, wgsl, &[&a.buffer, &b.buffer, &out.buffer], grid);
        Ok(())
    }

    fn in_place(&self, name: &'static str, wgsl: &str, a: &mut Buffer, b: &Buffer) -> Result<()> {
        let grid = self.grid(a.size())?;
        let (b, a) = (gpu(b)?, gpu_mut(a)?);
        self.dispatch(name, wgsl, &[&a.buffer, &b.buffer], grid);
        Ok(())
    }
}

impl Device for WgpuDevice {
    fn device_type(&self) -> DeviceType {
        DEVICE
    }

    fn tolerance(&self) -> Tolerance {
        Tolerance::gpu()
    }

    fn new_buffer(&self, data: Vec<f32>, shape: Shape) -> Result<Buffer> {
        compat::check_host_data(data.len(), shape)?;
        let len = data.len();
        // Zero-sized bindings are invalid, so keep at least one element.
        let contents = if data.is_empty() { vec![0.0] } else { data };
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("gpuplay buffer"),
                contents: bytemuck::cast_slice(&contents),
                usage: BufferUsages::STORAGE | BufferUsages::COPY_SRC | BufferUsages::COPY_DST,
            });
        Ok(Buffer::new(GpuBuffer { buffer, len }, shape, DEVICE))
    }

    fn new_buffer_with_shape(&self, shape: Shape) -> Result<Buffer> {
        self.new_buffer(vec![0.0; shape.numel()], shape)
    }

    fn add(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        self.binary("add", SHADER_ADD, a, b, out)
    }

    fn sub(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        self.binary("sub", SHADER_SUB, a, b, out)
    }

    fn add_assign(&self, a: &mut Buffer, b: &Buffer) -> Result<()> {
        self.in_place("add_assign", SHADER_ADD_ASSIGN, a, b)
    }

    fn sub_assign(&self, a: &mut Buffer, b: &Buffer) -> Result<()> {
        self.in_place("sub_assign", SHADER_SUB_ASSIGN, a, b)
    }

    fn cmul(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        self.binary("cmul", SHADER_CMUL, a, b, out)
    }

    fn cdiv(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        self.binary("cdiv", SHADER_CDIV, a, b, out)
    }

    fn smul(&self, a: &Buffer, s: &Buffer, out: &mut Buffer) -> Result<()> {
        self.binary("smul", SHADER_SMUL, a, s, out)
    }

    fn mul(&self, a: &Buffer, b: &Buffer, out: &mut Buffer) -> Result<()> {
        let (m, k, n) = (a.shape().rows, a.shape().cols, b.shape().cols);
        let grid = self.grid(m * n)?;
        let dims = self.dims_uniform([m as u32, n as u32, k as u32, 0]);
        let (a, b, out) = (gpu(a)?, gpu(b)?, gpu_mut(out)?);
        self.dispatch(
            "matmul",
            SHADER_MATMUL,
            &[&dims, &a.buffer, &b.buffer, &out.buffer],
            grid,
        );
        Ok(())
    }

    fn transpose(&self, a: &Buffer, out: &mut Buffer) -> Result<()> {
        let Shape { rows, cols } = a.shape();
        let grid = self.grid(rows * cols)?;
        let dims = self.dims_uniform([rows as u32, cols as u32, 0, 0]);
        let (a, out) = (gpu(a)?, gpu_mut(out)?);
        self.dispatch(
            "transpose",
            SHADER_TRANSPOSE,
            &[&dims, &a.buffer, &out.buffer],
            grid,
        );
        Ok(())
    }

    fn copy_buffer(&self, from: &Buffer, to: &mut Buffer) -> Result<()> {
        let (from, to) = (gpu(from)?, gpu_mut(to)?);
        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("copy_buffer"),
            });
        encoder.copy_buffer_to_buffer(&from.buffer, 0, &to.buffer, 0, from.byte_size());
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn cpu(&self, buffer: &Buffer) -> Result<Vec<f32>> {
        let source = gpu(buffer)?;
        if source.len == 0 {
            return Ok(Vec::new());
        }
        let size = source.byte_size();

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging"),
            size,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("readback"),
            });
        encoder.copy_buffer_to_buffer(&source.buffer, 0, &staging, 0, size);
        self.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|e| Error::backend(DEVICE, e.to_string()))?
            .map_err(|e| Error::backend(DEVICE, e.to_string()))?;

        let values = bytemuck::cast_slice::<u8, f32>(&slice.get_mapped_range()).to_vec();
        staging.unmap();
        Ok(values)
    }

    fn sync(&self, buffer: &Buffer) -> Result<()> {
        gpu(buffer)?;
        self.device.poll(wgpu::Maintain::Wait);
        Ok(())
    }
}

// =============================================================================
// Dispatch Grid
// =============================================================================

/// Splits `count` invocations of `WORKGROUP_SIZE` into an `(x, y)` grid with
/// both dimensions at most `limit`.
///
/// Shaders flatten the grid as `id.y * num_workgroups.x * 256 + id.x` and
/// skip indices past the end of their output.
fn dispatch_grid(count: usize, limit: u32) -> Result<(u32, u32)> {
    let groups = count.div_ceil(WORKGROUP_SIZE).max(1);
    let x = groups.min(limit as usize);
    let y = groups.div_ceil(x);
    match u32::try_from(y) {
        Ok(y) if y <= limit => Ok((x as u32, y)),
        _ => Err(Error::backend(
            DEVICE,
            format!("{count} elements exceed the dispatch limit {limit}x{limit}"),
        )),
    }
}

// =============================================================================
// WGSL Shaders
// =============================================================================

/// WGSL shader for element-wise addition.
pub const SHADER_ADD: &str = r"
@group(0) @binding(0) var<storage, read> a: array<f32>;
@group(0) @binding(1) var<storage, read> b: array<f32>;
@group(0) @binding(2) var<storage, read_write> result: array<f32>;

@compute @workgroup_size(256)
fn main(
    @builtin(global_invocation_id) global_id: vec3<u32>,
    @builtin(num_workgroups) groups: vec3<u32>,
) {
    let index = global_id.y * groups.x * 256u + global_id.x;
    if (index < arrayLength(&result)) {
        result[index] = a[index] + b[index];
    }
}
";

/// WGSL shader for element-wise subtraction.
pub const SHADER_SUB: &str = r"
@group(0) @binding(0) var<storage, read> a: array<f32>;
@group(0) @binding(1) var<storage, read> b: array<f32>;
@group(0) @binding(2) var<storage, read_write> result: array<f32>;

@compute @workgroup_size(256)
fn main(
    @builtin(global_invocation_id) global_id: vec3<u32>,
    @builtin(num_workgroups) groups: vec3<u32>,
) {
    let index = global_id.y * groups.x * 256u + global_id.x;
    if (index < arrayLength(&result)) {
        result[index] = a[index] - b[index];
    }
}
";

/// WGSL shader for element-wise multiplication.
pub const SHADER_CMUL: &str = r"
@group(0) @binding(0) var<storage, read> a: array<f32>;
@group(0) @binding(1) var<storage, read> b: array<f32>;
@group(0) @binding(2) var<storage, read_write> result: array<f32>;

@compute @workgroup_size(256)
fn main(
    @builtin(global_invocation_id) global_id: vec3<u32>,
    @builtin(num_workgroups) groups: vec3<u32>,
) {
    let index = global_id.y * groups.x * 256u + global_id.x;
    if (index < arrayLength(&result)) {
        result[index] = a[index] * b[index];
    }
}
";

/// WGSL shader for element-wise division.
pub const SHADER_CDIV: &str = r"
@group(0) @binding(0) var<storage, read> a: array<f32>;
@group(0) @binding(1) var<storage, read> b: array<f32>;
@group(0) @binding(2) var<storage, read_write> result: array<f32>;

@compute @workgroup_size(256)
fn main(
    @builtin(global_invocation_id) global_id: vec3<u32>,
    @builtin(num_workgroups) groups: vec3<u32>,
) {
    let index = global_id.y * groups.x * 256u + global_id.x;
    if (index < arrayLength(&result)) {
        result[index] = a[index] / b[index];
    }
}
";

/// WGSL shader scaling every element by the first element of `s`.
pub const SHADER_SMUL: &str = r"
@group(0) @binding(0) var<storage, read> a: array<f32>;
@group(0) @binding(1) var<storage, read> s: array<f32>;
@group(0) @binding(2) var<storage, read_write> result: array<f32>;

@compute @workgroup_size(256)
fn main(
    @builtin(global_invocation_id) global_id: vec3<u32>,
    @builtin(num_workgroups) groups: vec3<u32>,
) {
    let index = global_id.y * groups.x * 256u + global_id.x;
    if (index < arrayLength(&result)) {
        result[index] = s[0] * a[index];
    }
}
";

/// WGSL shader for in-place addition.
pub const SHADER_ADD_ASSIGN: &str = r"
@group(0) @binding(0) var<storage, read_write> a: array<f32>;
@group(0) @binding(1) var<storage, read> b: array<f32>;

@compute @workgroup_size(256)
fn main(
    @builtin(global_invocation_id) global_id: vec3<u32>,
    @builtin(num_workgroups) groups: vec3<u32>,
) {
    let index = global_id.y * groups.x * 256u + global_id.x;
    if (index < arrayLength(&a)) {
        a[index] = a[index] + b[index];
    }
}
";

/// WGSL shader for in-place subtraction.
pub const SHADER_SUB_ASSIGN: &str = r"
@group(0) @binding(0) var<storage, read_write> a: array<f32>;
@group(0) @binding(1) var<storage, read> b: array<f32>;

@compute @workgroup_size(256)
fn main(
    @builtin(global_invocation_id) global_id: vec3<u32>,
    @builtin(num_workgroups) groups: vec3<u32>,
) {
    let index = global_id.y * groups.x * 256u + global_id.x;
    if (index < arrayLength(&a)) {
        a[index] = a[index] - b[index];
    }
}
";

/// WGSL shader for matrix multiplication.
pub const SHADER_MATMUL: &str = r"
struct Dimensions {
    M: u32,
    N: u32,
    K: u32,
    _pad: u32,
}

@group(0) @binding(0) var<uniform> dims: Dimensions;
@group(0) @binding(1) var<storage, read> a: array<f32>;
@group(0) @binding(2) var<storage, read> b: array<f32>;
@group(0) @binding(3) var<storage, read_write> result: array<f32>;

@compute @workgroup_size(256)
fn main(
    @builtin(global_invocation_id) global_id: vec3<u32>,
    @builtin(num_workgroups) groups: vec3<u32>,
) {
    let index = global_id.y * groups.x * 256u + global_id.x;
    if (index >= dims.M * dims.N) {
        return;
    }
    let row = index / dims.N;
    let col = index % dims.N;

    var sum = 0.0;
    for (var k = 0u; k < dims.K; k++) {
        sum += a[row * dims.K + k] * b[k * dims.N + col];
    }
    result[index] = sum;
}
";

/// WGSL shader for transpose.
pub const SHADER_TRANSPOSE: &str = r"
struct Dimensions {
    rows: u32,
    cols: u32,
    _pad0: u32,
    _pad1: u32,
}

@group(0) @binding(0) var<uniform> dims: Dimensions;
@group(0) @binding(1) var<storage, read> a: array<f32>;
@group(0) @binding(2) var<storage, read_write> result: array<f32>;

@compute @workgroup_size(256)
fn main(
    @builtin(global_invocation_id) global_id: vec3<u32>,
    @builtin(num_workgroups) groups: vec3<u32>,
) {
    let index = global_id.y * groups.x * 256u + global_id.x;
    if (index >= dims.rows * dims.cols) {
        return;
    }
    // `index` walks the cols x rows output in row-major order.
    let row = index % dims.rows;
    let col = index / dims.rows;
    result[index] = a[row * dims.cols + col];
}
";

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_grid_fits_one_row() {
        assert_eq!(dispatch_grid(1, 65_535).unwrap(), (1, 1));
        assert_eq!(dispatch_grid(300, 65_535).unwrap(), (2, 1));
        assert_eq!(dispatch_grid(65_535 * 256, 65_535).unwrap(), (65_535, 1));
    }

    #[test]
    fn test_dispatch_grid_spills_into_y() {
        let count = 17_000_000;
        let (x, y) = dispatch_grid(count, 65_535).unwrap();
        assert_eq!((x, y), (65_535, 2));
        assert!(x as usize * y as usize * WORKGROUP_SIZE >= count);
    }

    #[test]
    fn test_dispatch_grid_limit_exceeded() {
        let count = 5 * 5 * WORKGROUP_SIZE;
        assert_eq!(dispatch_grid(count, 5).unwrap(), (5, 5));
        assert!(matches!(
            dispatch_grid(count + 1, 5),
            Err(Error::Backend {
                device: DeviceType::Wgpu,
                ..
            })
        ));
    }

    // Adapters are optional on CI machines, so every test bails out quietly
    // when none is present.
    fn device() -> Option<WgpuDevice> {
        WgpuDevice::new().ok()
    }

    #[test]
    fn test_add_and_readback() {
        let Some(device) = device() else { return };
        let shape = Shape::row(300);
        let a = device.new_buffer(vec![1.0; 300], shape).unwrap();
        let b = device.new_buffer(vec![2.0; 300], shape).unwrap();
        let mut out = device.new_buffer_with_shape(shape).unwrap();
        device.add(&a, &b, &mut out).unwrap();
        assert_eq!(device.cpu(&out).unwrap(), vec![3.0; 300]);
    }

    #[test]
    fn test_matmul_and_transpose() {
        let Some(device) = device() else { return };
        let a = device
            .new_buffer(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], Shape::new(2, 3))
            .unwrap();
        let b = device
            .new_buffer(vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0], Shape::new(3, 2))
            .unwrap();
        let mut out = device.new_buffer_with_shape(Shape::new(2, 2)).unwrap();
        device.mul(&a, &b, &mut out).unwrap();
        assert!(device
            .tolerance()
            .all_close(&device.cpu(&out).unwrap(), &[58.0, 64.0, 139.0, 154.0]));

        let mut t = device.new_buffer_with_shape(Shape::new(3, 2)).unwrap();
        device.transpose(&a, &mut t).unwrap();
        assert_eq!(device.cpu(&t).unwrap(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_in_place_and_copy() {
        let Some(device) = device() else { return };
        let shape = Shape::column(4);
        let mut a = device.new_buffer(vec![1.0, 2.0, 3.0, 4.0], shape).unwrap();
        let b = device.new_buffer(vec![1.0; 4], shape).unwrap();
        device.sub_assign(&mut a, &b).unwrap();

        let mut c = device.new_buffer_with_shape(shape).unwrap();
        device.copy_buffer(&a, &mut c).unwrap();
        assert_eq!(device.cpu(&c).unwrap(), vec![0.0, 1.0, 2.0, 3.0]);
    }
}
