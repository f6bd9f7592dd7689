// Shader module loading
//
// Vulkan consumes SPIR-V bytecode. The two binaries are read from disk at
// startup, handed to the driver, and discarded once the pipeline exists.

use anyhow::{Context, Result};
use ash::vk;
use std::io::Cursor;
use std::path::Path;

use super::VulkanDevice;

/// Read a compiled SPIR-V binary from disk.
///
/// Rejects obviously malformed files (empty, or not a whole number of
/// 4-byte SPIR-V words) before the bytes ever reach the driver.
pub fn load_spirv<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read shader binary: {:?}", path))?;

    if bytes.is_empty() {
        anyhow::bail!("Shader binary is empty: {:?}", path);
    }
    if bytes.len() % 4 != 0 {
        anyhow::bail!(
            "Shader binary {:?} is {} bytes, not a multiple of the SPIR-V word size",
            path,
            bytes.len()
        );
    }

    Ok(bytes)
}

/// Create a shader module from SPIR-V bytes
pub fn create_shader_module(device: &VulkanDevice, code: &[u8]) -> Result<vk::ShaderModule> {
    // read_spv handles the byte-to-word conversion and alignment
    let words = ash::util::read_spv(&mut Cursor::new(code))
        .context("Failed to decode SPIR-V words")?;

    let create_info = vk::ShaderModuleCreateInfo::builder().code(&words);

    unsafe {
        device
            .device
            .create_shader_module(&create_info, None)
            .context("Failed to create shader module")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &[u8]) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("vk-triangle-shader-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_exact_byte_length() {
        // 12 bytes: three SPIR-V words
        let contents = [0u8; 12];
        let path = temp_file("exact.spv", &contents);

        let bytes = load_spirv(&path).unwrap();
        assert_eq!(bytes.len(), contents.len());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn rejects_missing_file() {
        assert!(load_spirv("shaders/definitely-not-here.spv").is_err());
    }

    #[test]
    fn rejects_empty_file() {
        let path = temp_file("empty.spv", &[]);
        assert!(load_spirv(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn rejects_truncated_word() {
        let path = temp_file("truncated.spv", &[0u8; 7]);
        assert!(load_spirv(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
