//! macOS backends: CoreGraphics window list, the accessibility API, and the
//! private SkyLight desktop symbols.

use std::ffi::{CStr, c_void};
use std::sync::OnceLock;

use core_foundation::array::{CFArray, CFArrayRef};
use core_foundation::base::{CFType, CFTypeRef, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::CFDictionary;
use core_foundation::number::CFNumber;
use core_foundation::string::{CFString, CFStringRef};
use core_graphics::geometry::{CGPoint, CGRect, CGSize};
use core_graphics::window::{
    CGWindowListOption, copy_window_info, kCGNullWindowID, kCGWindowListExcludeDesktopElements,
    kCGWindowListOptionAll,
};
use devmux_core::Rect;
use objc2_app_kit::NSRunningApplication;
use objc2_foundation::NSString;

use crate::locator::{Accessibility, Compositor};
use crate::spaces::{RawDisplay, RawSpace, SpaceProvider};
use crate::types::{AxWindow, CompositorWindow};

// ─── CoreFoundation helpers ───────────────────────────────────────

fn items(array: &CFArray) -> Vec<CFType> {
    array
        .iter()
        .filter(|item| !item.is_null())
        .map(|item| unsafe { CFType::wrap_under_get_rule(*item as CFTypeRef) })
        .collect()
}

fn get(dict: &CFDictionary, key: &str) -> Option<CFType> {
    let key = CFString::new(key);
    dict.find(key.as_concrete_TypeRef() as *const c_void)
        .filter(|v| !v.is_null())
        .map(|v| unsafe { CFType::wrap_under_get_rule(*v as CFTypeRef) })
}

fn get_i64(dict: &CFDictionary, key: &str) -> Option<i64> {
    get(dict, key)?.downcast::<CFNumber>()?.to_i64()
}

fn get_string(dict: &CFDictionary, key: &str) -> Option<String> {
    get(dict, key)?.downcast::<CFString>().map(|s| s.to_string())
}

fn get_dict(dict: &CFDictionary, key: &str) -> Option<CFDictionary> {
    get(dict, key)?.downcast::<CFDictionary>()
}

fn get_array(dict: &CFDictionary, key: &str) -> Option<CFArray> {
    get(dict, key)?.downcast::<CFArray>()
}

fn to_rect(r: CGRect) -> Rect {
    Rect::new(r.origin.x, r.origin.y, r.size.width, r.size.height)
}

// ─── Compositor ───────────────────────────────────────────────────

/// Every desktop, not just the current one; desktop switching depends on
/// seeing windows that are off screen.
const WINDOW_LIST: CGWindowListOption = kCGWindowListOptionAll | kCGWindowListExcludeDesktopElements;

/// Window list from `CGWindowListCopyWindowInfo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CgCompositor;

impl Compositor for CgCompositor {
    fn windows(&self) -> Vec<CompositorWindow> {
        let Some(list) = copy_window_info(WINDOW_LIST, kCGNullWindowID) else {
            tracing::debug!("window list unavailable");
            return Vec::new();
        };
        items(&list)
            .iter()
            .filter_map(|item| item.downcast::<CFDictionary>())
            .filter_map(|info| compositor_window(&info))
            .collect()
    }
}

fn compositor_window(info: &CFDictionary) -> Option<CompositorWindow> {
    // layer 0 is ordinary application windows
    if get_i64(info, "kCGWindowLayer").unwrap_or(0) != 0 {
        return None;
    }
    let bounds = get_dict(info, "kCGWindowBounds")?;
    Some(CompositorWindow {
        id: u32::try_from(get_i64(info, "kCGWindowNumber")?).ok()?,
        owner_pid: i32::try_from(get_i64(info, "kCGWindowOwnerPID")?).ok()?,
        owner_name: get_string(info, "kCGWindowOwnerName").unwrap_or_default(),
        title: get_string(info, "kCGWindowName").unwrap_or_default(),
        frame: to_rect(CGRect::from_dict_representation(&bounds)?),
    })
}

// ─── Accessibility ────────────────────────────────────────────────

const AX_VALUE_CG_POINT: u32 = 1;
const AX_VALUE_CG_SIZE: u32 = 2;

#[link(name = "ApplicationServices", kind = "framework")]
unsafe extern "C" {
    fn AXIsProcessTrusted() -> bool;
    fn AXUIElementCreateApplication(pid: i32) -> CFTypeRef;
    fn AXUIElementCopyAttributeValue(
        element: CFTypeRef,
        attribute: CFStringRef,
        value: *mut CFTypeRef,
    ) -> i32;
    fn AXUIElementSetAttributeValue(element: CFTypeRef, attribute: CFStringRef, value: CFTypeRef)
    -> i32;
    fn AXUIElementPerformAction(element: CFTypeRef, action: CFStringRef) -> i32;
    fn AXValueGetValue(value: CFTypeRef, kind: u32, out: *mut c_void) -> bool;
}

fn ax_attr(element: &CFType, name: &str) -> Option<CFType> {
    let attr = CFString::new(name);
    let mut value: CFTypeRef = std::ptr::null();
    let err = unsafe {
        AXUIElementCopyAttributeValue(element.as_CFTypeRef(), attr.as_concrete_TypeRef(), &mut value)
    };
    if err != 0 || value.is_null() {
        return None;
    }
    Some(unsafe { CFType::wrap_under_create_rule(value) })
}

fn ax_frame(element: &CFType) -> Option<Rect> {
    let mut origin = CGPoint::new(0.0, 0.0);
    let mut size = CGSize::new(0.0, 0.0);
    let pos = ax_attr(element, "AXPosition")?;
    let dim = ax_attr(element, "AXSize")?;
    let ok = unsafe {
        AXValueGetValue(pos.as_CFTypeRef(), AX_VALUE_CG_POINT, (&mut origin as *mut CGPoint).cast())
            && AXValueGetValue(dim.as_CFTypeRef(), AX_VALUE_CG_SIZE, (&mut size as *mut CGSize).cast())
    };
    ok.then(|| Rect::new(origin.x, origin.y, size.width, size.height))
}

fn ax_windows(pid: i32) -> Option<Vec<CFType>> {
    if !unsafe { AXIsProcessTrusted() } {
        return None;
    }
    let app = unsafe { AXUIElementCreateApplication(pid) };
    if app.is_null() {
        return None;
    }
    let app = unsafe { CFType::wrap_under_create_rule(app) };
    let windows = ax_attr(&app, "AXWindows")?.downcast::<CFArray>()?;
    Some(items(&windows))
}

fn ax_title(element: &CFType) -> String {
    ax_attr(element, "AXTitle")
        .and_then(|t| t.downcast::<CFString>())
        .map(|t| t.to_string())
        .unwrap_or_default()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AxAccessibility;

fn running_pid(bundle_id: &str) -> Option<i32> {
    let id = NSString::from_str(bundle_id);
    #[allow(unused_unsafe)]
    let apps = unsafe { NSRunningApplication::runningApplicationsWithBundleIdentifier(&id) };
    let app = apps.firstObject()?;
    #[allow(unused_unsafe)]
    let pid = unsafe { app.processIdentifier() };
    (pid > 0).then_some(pid)
}

impl Accessibility for AxAccessibility {
    fn app_pid(&self, bundle_id: &str, app_name: &str) -> Option<i32> {
        if let Some(pid) = running_pid(bundle_id) {
            return Some(pid);
        }
        tracing::debug!("{bundle_id} not in running applications; trying window owners");
        CgCompositor
            .windows()
            .into_iter()
            .find(|w| w.owner_name == app_name)
            .map(|w| w.owner_pid)
    }

    fn windows(&self, pid: i32) -> Option<Vec<AxWindow>> {
        let windows = ax_windows(pid)?;
        Some(
            windows
                .iter()
                .enumerate()
                .map(|(index, w)| AxWindow {
                    pid,
                    index,
                    title: ax_title(w),
                    frame: ax_frame(w),
                })
                .collect(),
        )
    }

    fn raise(&self, window: &AxWindow) -> bool {
        let Some(windows) = ax_windows(window.pid) else {
            return false;
        };
        // the list may have shifted since it was read; confirm by title
        let Some(element) = windows
            .get(window.index)
            .filter(|w| ax_title(w) == window.title)
            .or_else(|| windows.iter().find(|w| ax_title(w) == window.title))
        else {
            return false;
        };
        let raise = CFString::new("AXRaise");
        let main = CFString::new("AXMain");
        unsafe {
            let raised = AXUIElementPerformAction(element.as_CFTypeRef(), raise.as_concrete_TypeRef());
            AXUIElementSetAttributeValue(
                element.as_CFTypeRef(),
                main.as_concrete_TypeRef(),
                CFBoolean::true_value().as_CFTypeRef(),
            );
            raised == 0
        }
    }
}

// ─── SkyLight desktops ────────────────────────────────────────────

const SKYLIGHT: &CStr = c"/System/Library/PrivateFrameworks/SkyLight.framework/SkyLight";

/// Current, other, and hidden desktops.
const ALL_SPACES_MASK: i32 = 0x7;

type MainConnectionFn = unsafe extern "C" fn() -> i32;
type ActiveSpaceFn = unsafe extern "C" fn(i32) -> u64;
type CopyDisplaySpacesFn = unsafe extern "C" fn(i32) -> CFArrayRef;
type CopySpacesForWindowsFn = unsafe extern "C" fn(i32, i32, CFArrayRef) -> CFArrayRef;
type SetCurrentSpaceFn = unsafe extern "C" fn(i32, CFStringRef, u64);

struct SkyLight {
    main_connection: MainConnectionFn,
    active_space: ActiveSpaceFn,
    copy_display_spaces: CopyDisplaySpacesFn,
    copy_spaces_for_windows: CopySpacesForWindowsFn,
    set_current_space: SetCurrentSpaceFn,
}

static SKYLIGHT_FNS: OnceLock<Option<SkyLight>> = OnceLock::new();

unsafe fn symbol(handle: *mut c_void, name: &CStr) -> Option<*mut c_void> {
    let sym = unsafe { libc::dlsym(handle, name.as_ptr()) };
    if sym.is_null() {
        tracing::debug!("SkyLight symbol {name:?} missing");
        None
    } else {
        Some(sym)
    }
}

impl SkyLight {
    fn get() -> Option<&'static SkyLight> {
        SKYLIGHT_FNS.get_or_init(Self::bind).as_ref()
    }

    fn bind() -> Option<SkyLight> {
        unsafe {
            let handle = libc::dlopen(SKYLIGHT.as_ptr(), libc::RTLD_LAZY);
            if handle.is_null() {
                tracing::info!("SkyLight not loadable; desktop switching disabled");
                return None;
            }
            Some(SkyLight {
                main_connection: std::mem::transmute::<*mut c_void, MainConnectionFn>(symbol(
                    handle,
                    c"SLSMainConnectionID",
                )?),
                active_space: std::mem::transmute::<*mut c_void, ActiveSpaceFn>(symbol(
                    handle,
                    c"SLSGetActiveSpace",
                )?),
                copy_display_spaces: std::mem::transmute::<*mut c_void, CopyDisplaySpacesFn>(
                    symbol(handle, c"SLSCopyManagedDisplaySpaces")?,
                ),
                copy_spaces_for_windows: std::mem::transmute::<*mut c_void, CopySpacesForWindowsFn>(
                    symbol(handle, c"SLSCopySpacesForWindows")?,
                ),
                set_current_space: std::mem::transmute::<*mut c_void, SetCurrentSpaceFn>(symbol(
                    handle,
                    c"SLSManagedDisplaySetCurrentSpace",
                )?),
            })
        }
    }

    fn connection(&self) -> i32 {
        unsafe { (self.main_connection)() }
    }
}

fn space_id(dict: &CFDictionary) -> Option<u64> {
    get_i64(dict, "id64")
        .or_else(|| get_i64(dict, "ManagedSpaceID"))
        .and_then(|id| u64::try_from(id).ok())
}

fn raw_display(dict: &CFDictionary) -> Option<RawDisplay> {
    let display_id = get_string(dict, "Display Identifier")?;
    let current_space_id = get_dict(dict, "Current Space")
        .as_ref()
        .and_then(space_id)
        .unwrap_or(0);
    let spaces = get_array(dict, "Spaces")
        .map(|a| items(&a))
        .unwrap_or_default()
        .iter()
        .filter_map(|s| s.downcast::<CFDictionary>())
        .filter_map(|s| {
            Some(RawSpace {
                id: space_id(&s)?,
                kind: get_i64(&s, "type").unwrap_or(0),
            })
        })
        .collect();
    Some(RawDisplay {
        display_id,
        current_space_id,
        spaces,
    })
}

/// Desktop access through SkyLight, bound at first use.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkyLightSpaces;

impl SkyLightSpaces {
    pub fn load() -> Self {
        // bind eagerly so availability is logged once, up front
        let _ = SkyLight::get();
        Self
    }
}

impl SpaceProvider for SkyLightSpaces {
    fn available(&self) -> bool {
        SkyLight::get().is_some()
    }

    fn managed_displays(&self) -> Vec<RawDisplay> {
        let Some(sl) = SkyLight::get() else {
            return Vec::new();
        };
        let raw = unsafe { (sl.copy_display_spaces)(sl.connection()) };
        if raw.is_null() {
            return Vec::new();
        }
        let displays: CFArray = unsafe { CFArray::wrap_under_create_rule(raw) };
        items(&displays)
            .iter()
            .filter_map(|d| d.downcast::<CFDictionary>())
            .filter_map(|d| raw_display(&d))
            .collect()
    }

    fn active_space(&self) -> Option<u64> {
        let sl = SkyLight::get()?;
        Some(unsafe { (sl.active_space)(sl.connection()) })
    }

    fn spaces_for_window(&self, window_id: u32) -> Vec<u64> {
        let Some(sl) = SkyLight::get() else {
            return Vec::new();
        };
        let ids = CFArray::from_CFTypes(&[CFNumber::from(i64::from(window_id))]);
        let raw = unsafe {
            (sl.copy_spaces_for_windows)(sl.connection(), ALL_SPACES_MASK, ids.as_concrete_TypeRef())
        };
        if raw.is_null() {
            return Vec::new();
        }
        let spaces: CFArray = unsafe { CFArray::wrap_under_create_rule(raw) };
        items(&spaces)
            .iter()
            .filter_map(|n| n.downcast::<CFNumber>()?.to_i64())
            .filter_map(|n| u64::try_from(n).ok())
            .collect()
    }

    fn set_current_space(&self, display_id: &str, space_id: u64) -> bool {
        let Some(sl) = SkyLight::get() else {
            return false;
        };
        let display = CFString::new(display_id);
        unsafe { (sl.set_current_space)(sl.connection(), display.as_concrete_TypeRef(), space_id) };
        true
    }
}
