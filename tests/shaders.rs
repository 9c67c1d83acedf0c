//! The shipped shaders must parse, validate, and agree with the host-side
//! layouts.

use charge_field::compute::{compute_entry_points, COMPUTE_SHADER};
use charge_field::driver::KERNEL_NAME;
use charge_field::render::DRAW_SHADER;

fn validate_wgsl(code: &str) -> Result<naga::Module, String> {
  let module =
    naga::front::wgsl::parse_str(code).map_err(|e| format!("WGSL parse error: {:?}", e))?;

  let mut validator = naga::valid::Validator::new(
    naga::valid::ValidationFlags::all(),
    naga::valid::Capabilities::all(),
  );
  validator
    .validate(&module)
    .map_err(|e| format!("WGSL validation error: {:?}", e))?;

  Ok(module)
}

fn struct_span(module: &naga::Module, name: &str) -> u32 {
  module
    .types
    .iter()
    .find(|(_, ty)| ty.name.as_deref() == Some(name))
    .map(|(_, ty)| match &ty.inner {
      naga::TypeInner::Struct { span, .. } => *span,
      other => panic!("{name} is not a struct: {other:?}"),
    })
    .unwrap_or_else(|| panic!("no struct named {name}"))
}

#[test]
fn compute_shader_validates() {
  validate_wgsl(COMPUTE_SHADER).unwrap();
}

#[test]
fn draw_shader_validates() {
  validate_wgsl(DRAW_SHADER).unwrap();
}

#[test]
fn kernel_entry_point_exists() {
  let module = validate_wgsl(COMPUTE_SHADER).unwrap();
  assert!(module
    .entry_points
    .iter()
    .any(|e| e.name == KERNEL_NAME && e.stage == naga::ShaderStage::Compute));
  assert_eq!(compute_entry_points(COMPUTE_SHADER), vec![KERNEL_NAME]);
}

#[test]
fn kernel_workgroup_matches_dispatch_capacity() {
  let module = validate_wgsl(COMPUTE_SHADER).unwrap();
  let entry = module
    .entry_points
    .iter()
    .find(|e| e.name == KERNEL_NAME)
    .unwrap();
  let threads: u32 = entry.workgroup_size.iter().product();
  assert_eq!(threads, charge_field::driver::THREADS_PER_GROUP);
}

#[test]
fn particle_struct_matches_host_stride() {
  for source in [COMPUTE_SHADER, DRAW_SHADER] {
    let module = validate_wgsl(source).unwrap();
    assert_eq!(
      struct_span(&module, "Particle") as usize,
      charge_field::PARTICLE_STRIDE
    );
  }
}

#[test]
fn params_block_matches_host_layout() {
  let module = validate_wgsl(COMPUTE_SHADER).unwrap();
  assert_eq!(
    struct_span(&module, "Params") as usize,
    std::mem::size_of::<charge_field::compute::KernelParams>()
  );
}
