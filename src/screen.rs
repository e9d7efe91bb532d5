//! Memory-mapped framebuffer device binding.
//!
//! [`Screen`] is a [`Surface`] whose pixel storage is a shared,
//! read/write mapping of a framebuffer device (`/dev/fb0` and friends)
//! instead of a heap allocation. Geometry comes from the driver's fixed
//! and variable screen-info queries; the physical stride may exceed the
//! logical width, which the surface carries as its line length.
//!
//! The structs and ioctl numbers mirror `<linux/fb.h>`, which libc does
//! not export.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::os::fd::AsRawFd;
use std::path::Path;
use std::ptr;
use std::slice;

use thiserror::Error;

use crate::color::PixelFormat;
use crate::store::PixelStore;
use crate::surface::Surface;

const FBIOGET_VSCREENINFO: libc::c_ulong = 0x4600;
const FBIOGET_FSCREENINFO: libc::c_ulong = 0x4602;

/// Fixed screen information, `struct fb_fix_screeninfo`.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct FixScreenInfo {
    pub id: [u8; 16],
    pub smem_start: libc::c_ulong,
    pub smem_len: u32,
    pub fb_type: u32,
    pub type_aux: u32,
    pub visual: u32,
    pub xpanstep: u16,
    pub ypanstep: u16,
    pub ywrapstep: u16,
    pub line_length: u32,
    pub mmio_start: libc::c_ulong,
    pub mmio_len: u32,
    pub accel: u32,
    pub capabilities: u16,
    pub reserved: [u16; 2],
}

/// Color channel geometry, `struct fb_bitfield`.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct Bitfield {
    pub offset: u32,
    pub length: u32,
    pub msb_right: u32,
}

/// Variable screen information, `struct fb_var_screeninfo`.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct VarScreenInfo {
    pub xres: u32,
    pub yres: u32,
    pub xres_virtual: u32,
    pub yres_virtual: u32,
    pub xoffset: u32,
    pub yoffset: u32,
    pub bits_per_pixel: u32,
    pub grayscale: u32,
    pub red: Bitfield,
    pub green: Bitfield,
    pub blue: Bitfield,
    pub transp: Bitfield,
    pub nonstd: u32,
    pub activate: u32,
    pub height: u32,
    pub width: u32,
    pub accel_flags: u32,
    pub pixclock: u32,
    pub left_margin: u32,
    pub right_margin: u32,
    pub upper_margin: u32,
    pub lower_margin: u32,
    pub hsync_len: u32,
    pub vsync_len: u32,
    pub sync: u32,
    pub vmode: u32,
    pub rotate: u32,
    pub colorspace: u32,
    pub reserved: [u32; 4],
}

/// Errors raised while binding to a framebuffer device.
///
/// A display is a required resource for this crate's consumers, so each
/// variant carries the process exit code historically reserved for its
/// stage ([`ScreenError::exit_code`]); terminating on it is the
/// outermost caller's decision.
#[derive(Debug, Error)]
pub enum ScreenError {
    /// Opening the device node failed.
    #[error("cannot open framebuffer device {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
    /// The fixed screen-information query failed.
    #[error("reading fixed screen information failed: {0}")]
    FixedInfo(#[source] io::Error),
    /// The variable screen-information query failed.
    #[error("reading variable screen information failed: {0}")]
    VariableInfo(#[source] io::Error),
    /// The device reports a color depth this crate has no format for.
    #[error("unsupported color depth of {0} bits per pixel")]
    UnsupportedDepth(u32),
    /// Mapping the device memory failed.
    #[error("mapping framebuffer device to memory failed: {0}")]
    Map(#[source] io::Error),
}

impl ScreenError {
    /// The process exit code reserved for this failure stage.
    pub fn exit_code(&self) -> i32 {
        match self {
            ScreenError::Open { .. } => 1,
            ScreenError::FixedInfo(_) => 2,
            ScreenError::VariableInfo(_) | ScreenError::UnsupportedDepth(_) => 3,
            ScreenError::Map(_) => 4,
        }
    }
}

/// A shared read/write memory mapping of device memory.
///
/// Owns the mapped region and unmaps it on drop. The descriptor it was
/// mapped from is owned separately by [`Screen`].
pub struct Mapping {
    ptr: *mut u8,
    len: usize,
}

impl Mapping {
    /// # Safety
    ///
    /// `ptr` must be the non-failed return of `mmap` for `len` bytes,
    /// and ownership of the mapping transfers to the returned value.
    unsafe fn from_raw(ptr: *mut u8, len: usize) -> Mapping {
        Mapping { ptr, len }
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr, self.len) }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.ptr as *mut libc::c_void, self.len);
        }
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

/// A [`Surface`] backed by a memory-mapped display device.
///
/// Dereferences to [`Surface`], so every drawing primitive applies to
/// the live framebuffer. Dropping the screen unmaps the device memory
/// and closes the descriptor.
#[derive(Debug)]
pub struct Screen {
    // Declared before the device so the mapping is torn down while the
    // descriptor is still open.
    surface: Surface,
    device: File,
    fix_info: FixScreenInfo,
    var_info: VarScreenInfo,
}

impl Screen {
    /// Bind to the framebuffer device at `path`.
    ///
    /// Opens the device read/write, queries its geometry and maps the
    /// visible resolution shared. When the driver reports a stride wider
    /// than `xres * bytes_per_pixel`, the mapping covers the full
    /// strided rows, so whole-surface draws stay inside the mapped
    /// region. Every failure stage maps to its own [`ScreenError`]
    /// variant.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Screen, ScreenError> {
        let path = path.as_ref();
        let device = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| ScreenError::Open {
                path: path.display().to_string(),
                source,
            })?;
        let fd = device.as_raw_fd();

        let mut fix_info: FixScreenInfo = unsafe { mem::zeroed() };
        if unsafe { libc::ioctl(fd, FBIOGET_FSCREENINFO as _, &mut fix_info as *mut FixScreenInfo) }
            == -1
        {
            return Err(ScreenError::FixedInfo(io::Error::last_os_error()));
        }

        let mut var_info: VarScreenInfo = unsafe { mem::zeroed() };
        if unsafe { libc::ioctl(fd, FBIOGET_VSCREENINFO as _, &mut var_info as *mut VarScreenInfo) }
            == -1
        {
            return Err(ScreenError::VariableInfo(io::Error::last_os_error()));
        }

        log::info!(
            "framebuffer device {} opened: {}x{}, {}bpp",
            path.display(),
            var_info.xres,
            var_info.yres,
            var_info.bits_per_pixel
        );

        let format = PixelFormat::from_bytes_per_pixel((var_info.bits_per_pixel / 8) as u16)
            .ok_or(ScreenError::UnsupportedDepth(var_info.bits_per_pixel))?;

        let size = mapped_size(&var_info, &fix_info);
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(ScreenError::Map(io::Error::last_os_error()));
        }
        let mapping = unsafe { Mapping::from_raw(ptr as *mut u8, size) };
        log::debug!("framebuffer mapped: {} bytes", size);

        let surface = Surface::from_parts(
            var_info.xres,
            var_info.yres,
            format,
            fix_info.line_length as usize,
            var_info.xoffset as i32,
            var_info.yoffset as i32,
            PixelStore::Mapped(mapping),
        );

        Ok(Screen {
            surface,
            device,
            fix_info,
            var_info,
        })
    }

    /// The driver's fixed screen-information record.
    pub fn fixed_info(&self) -> &FixScreenInfo {
        &self.fix_info
    }

    /// The driver's variable screen-information record.
    pub fn variable_info(&self) -> &VarScreenInfo {
        &self.var_info
    }

    /// The underlying device handle.
    pub fn device(&self) -> &File {
        &self.device
    }
}

/// Bytes to map for a device: the visible resolution, widened to the
/// driver's stride when that exceeds `xres * bytes_per_pixel`, so the
/// surface's `line_length * height` store invariant holds for sub-view
/// strides too.
fn mapped_size(var_info: &VarScreenInfo, fix_info: &FixScreenInfo) -> usize {
    let logical = (var_info.xres * var_info.yres * var_info.bits_per_pixel / 8) as usize;
    let strided = fix_info.line_length as usize * var_info.yres as usize;
    logical.max(strided)
}

impl Deref for Screen {
    type Target = Surface;

    fn deref(&self) -> &Surface {
        &self.surface
    }
}

impl DerefMut for Screen {
    fn deref_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }
}
