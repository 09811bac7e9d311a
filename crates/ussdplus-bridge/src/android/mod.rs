// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android platform bridge via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. Permission checks go through the hosting
// Activity; inbox reads go through `ContentResolver.query` on
// `content://sms/inbox`.
//
// ## Architecture notes
//
// Calls arrive on the thread the host's method channel dispatches on (the
// platform thread for a Flutter embedding). `requestPermissions` must be
// issued from that thread, so the handler is invoked inline there rather
// than on a worker.
//
// The permission prompt's answer is delivered to the Activity's
// `onRequestPermissionsResult` with request code [`REQUEST_READ_SMS`]. Nothing
// in this crate listens for it: the call that triggered the prompt has
// already failed, and the shell retries on its own schedule.

#![cfg(target_os = "android")]

use std::sync::OnceLock;

use jni::objects::{GlobalRef, JByteArray, JObject, JObjectArray, JString, JValue, JValueOwned};
use jni::sys::jsize;
use jni::{JNIEnv, JavaVM};

use ussdplus_core::error::{Result, UssdPlusError};
use ussdplus_core::types::{Capability, CellValue};

use crate::traits::*;

// ---------------------------------------------------------------------------
// Android constants
// ---------------------------------------------------------------------------

/// Request code passed to `requestPermissions`. The host Activity sees it in
/// `onRequestPermissionsResult`.
pub const REQUEST_READ_SMS: i32 = 1001;

/// `PackageManager.PERMISSION_GRANTED`.
const PERMISSION_GRANTED: i32 = 0;

/// First API level with runtime permissions (Android 6.0, Marshmallow).
/// Below it, manifest permissions are granted at install time.
const RUNTIME_PERMISSIONS_SDK: i32 = 23;

// `Cursor.getType` results.
const FIELD_TYPE_NULL: i32 = 0;
const FIELD_TYPE_INTEGER: i32 = 1;
const FIELD_TYPE_FLOAT: i32 = 2;
const FIELD_TYPE_STRING: i32 = 3;
const FIELD_TYPE_BLOB: i32 = 4;

const QUERY_SIG: &str = "(Landroid/net/Uri;[Ljava/lang/String;Ljava/lang/String;\
                         [Ljava/lang/String;Ljava/lang/String;)Landroid/database/Cursor;";

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

/// VM and hosting Activity recorded by [`initialize`].
struct AndroidContext {
    vm: JavaVM,
    activity: GlobalRef,
}

static CONTEXT: OnceLock<AndroidContext> = OnceLock::new();

/// Record the hosting Activity so later calls can reach the permission and
/// content-resolver APIs.
///
/// Flutter-style hosts never set up the NDK context, so the host calls this
/// once (from `NativeSmsChannel.init(activity)`) before the first method
/// call. The context is also published through `ndk_context` for other
/// native code in the process. Later calls are no-ops.
pub fn initialize(env: &mut JNIEnv<'_>, activity: &JObject<'_>) -> Result<()> {
    if CONTEXT.get().is_some() {
        tracing::debug!("Android: context already initialised");
        return Ok(());
    }

    let vm = env
        .get_java_vm()
        .map_err(|e| bridge_err(env, "GetJavaVM", e))?;
    let activity = env
        .new_global_ref(activity)
        .map_err(|e| bridge_err(env, "NewGlobalRef(activity)", e))?;

    let vm_ptr = vm.get_java_vm_pointer();
    let activity_ptr = activity.as_obj().as_raw();
    if CONTEXT.set(AndroidContext { vm, activity }).is_ok() {
        // SAFETY: the VM lives for the whole process and the Activity global
        // ref is owned by `CONTEXT`, which is never dropped.
        unsafe { ndk_context::initialize_android_context(vm_ptr.cast(), activity_ptr.cast()) };
        tracing::info!("Android: bridge context initialised");
    }
    Ok(())
}

/// Whether [`initialize`] has run.
pub fn is_initialized() -> bool {
    CONTEXT.get().is_some()
}

fn context() -> Result<&'static AndroidContext> {
    CONTEXT.get().ok_or_else(|| {
        UssdPlusError::Bridge(
            "Android bridge not initialised: NativeSmsChannel.init(activity) was never called"
                .into(),
        )
    })
}

/// Obtain a [`JNIEnv`] for the current thread, attaching it if needed.
fn jni_env() -> Result<JNIEnv<'static>> {
    context()?
        .vm
        .attach_current_thread_permanently()
        .map_err(|e| UssdPlusError::Bridge(format!("failed to attach JNI thread: {e}")))
}

/// The hosting Android `Activity`.
fn activity() -> Result<&'static JObject<'static>> {
    Ok(context()?.activity.as_obj())
}

/// Clear any pending Java exception and return its `toString()`.
fn take_exception(env: &mut JNIEnv<'_>) -> Option<String> {
    if !env.exception_check().unwrap_or(false) {
        return None;
    }
    let throwable = env.exception_occurred().ok()?;
    env.exception_clear().ok()?;
    let text = env
        .call_method(&throwable, "toString", "()Ljava/lang/String;", &[])
        .ok()?
        .l()
        .ok()?;
    if text.is_null() {
        return None;
    }
    java_string(env, text).ok()
}

/// Describe a JNI failure, pulling the Java exception text when there is one.
fn describe(env: &mut JNIEnv<'_>, context: &str, e: jni::errors::Error) -> String {
    if let jni::errors::Error::JavaException = e {
        if let Some(text) = take_exception(env) {
            return format!("{context}: {text}");
        }
    }
    format!("{context}: {e}")
}

/// Map a JNI failure on the permission path into `UssdPlusError::Bridge`.
fn bridge_err(env: &mut JNIEnv<'_>, context: &str, e: jni::errors::Error) -> UssdPlusError {
    UssdPlusError::Bridge(describe(env, context, e))
}

/// Map a JNI failure on the query path into `UssdPlusError::Store`.
fn store_err(env: &mut JNIEnv<'_>, context: &str, e: jni::errors::Error) -> UssdPlusError {
    UssdPlusError::Store(describe(env, context, e))
}

/// Convert a `java.lang.String` reference and release the local ref.
fn java_string(env: &mut JNIEnv<'_>, obj: JObject<'_>) -> jni::errors::Result<String> {
    let jstr = JString::from(obj);
    let text: String = env.get_string(&jstr)?.into();
    env.delete_local_ref(jstr)?;
    Ok(text)
}

/// Build a `String[]` from Rust strings.
fn string_array<'local>(
    env: &mut JNIEnv<'local>,
    items: &[String],
) -> jni::errors::Result<JObjectArray<'local>> {
    let array = env.new_object_array(items.len() as jsize, "java/lang/String", JObject::null())?;
    for (idx, item) in items.iter().enumerate() {
        let j_item = env.new_string(item)?;
        env.set_object_array_element(&array, idx as jsize, &j_item)?;
        env.delete_local_ref(j_item)?;
    }
    Ok(array)
}

/// `Build.VERSION.SDK_INT` of the running device.
fn sdk_int(env: &mut JNIEnv<'_>) -> Result<i32> {
    let value = env
        .get_static_field("android/os/Build$VERSION", "SDK_INT", "I")
        .map_err(|e| bridge_err(env, "Build.VERSION.SDK_INT", e))?;
    value
        .i()
        .map_err(|e| UssdPlusError::Bridge(format!("SDK_INT->i: {e}")))
}

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// Android implementation of the SMS platform bridge.
///
/// The struct is zero-sized; all state lives on the Java side.
pub struct AndroidBridge;

impl AndroidBridge {
    /// Create a new Android bridge.
    ///
    /// This does **not** touch JNI. The first JNI call happens lazily when
    /// a trait method is invoked.
    pub fn new() -> Self {
        Self
    }
}

impl Default for AndroidBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBridge for AndroidBridge {
    fn platform_name(&self) -> &str {
        "Android"
    }
}

// ---------------------------------------------------------------------------
// PermissionGate: Activity.checkSelfPermission / requestPermissions
// ---------------------------------------------------------------------------

impl PermissionGate for AndroidBridge {
    /// Devices below API 23 grant manifest permissions at install time, so
    /// the check passes without asking the Activity.
    fn is_granted(&self, capability: Capability) -> Result<bool> {
        let mut env = jni_env()?;

        let sdk = sdk_int(&mut env)?;
        if sdk < RUNTIME_PERMISSIONS_SDK {
            tracing::debug!(sdk, %capability, "pre-runtime-permission device; treating as granted");
            return Ok(true);
        }

        let activity = activity()?;
        let j_permission: JString = env
            .new_string(capability.android_permission())
            .map_err(|e| bridge_err(&mut env, "new_string(permission)", e))?;

        let status = env
            .call_method(
                activity,
                "checkSelfPermission",
                "(Ljava/lang/String;)I",
                &[JValue::Object(&j_permission)],
            )
            .map_err(|e| bridge_err(&mut env, "checkSelfPermission", e))?
            .i()
            .map_err(|e| UssdPlusError::Bridge(format!("checkSelfPermission->i: {e}")))?;

        tracing::debug!(sdk, %capability, status, "Android: permission status");
        Ok(status == PERMISSION_GRANTED)
    }

    /// Dispatch the system permission dialog and return immediately.
    fn request(&self, capability: Capability) -> Result<()> {
        let mut env = jni_env()?;
        if sdk_int(&mut env)? < RUNTIME_PERMISSIONS_SDK {
            return Ok(());
        }
        let activity = activity()?;

        let j_permission: JString = env
            .new_string(capability.android_permission())
            .map_err(|e| bridge_err(&mut env, "new_string(permission)", e))?;
        let permissions = env
            .new_object_array(1, "java/lang/String", &j_permission)
            .map_err(|e| bridge_err(&mut env, "new_object_array(permissions)", e))?;

        env.call_method(
            activity,
            "requestPermissions",
            "([Ljava/lang/String;I)V",
            &[JValue::Object(&permissions), JValue::Int(REQUEST_READ_SMS)],
        )
        .map_err(|e| bridge_err(&mut env, "requestPermissions", e))?;

        tracing::info!(
            %capability,
            request_code = REQUEST_READ_SMS,
            "Android: permission prompt dispatched"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MessageStore: ContentResolver.query(content://sms/inbox)
// ---------------------------------------------------------------------------

impl MessageStore for AndroidBridge {
    /// Query the SMS provider and lend the cursor to `visit`.
    ///
    /// The limit rides on the sort order (`"date DESC LIMIT 100"`), which the
    /// telephony provider passes straight to SQLite. A `null` cursor means the
    /// provider had nothing to return; `visit` is not called.
    fn query_inbox(
        &self,
        query: &InboxQuery,
        visit: &mut dyn FnMut(&mut dyn InboxCursor) -> Result<()>,
    ) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;

        tracing::info!(uri = %query.uri, limit = query.limit, "Android: querying SMS provider");

        // Uri.parse(uriString)
        let j_uri_str: JString = env
            .new_string(&query.uri)
            .map_err(|e| store_err(&mut env, "new_string(uri)", e))?;

        let uri: JObject = env
            .call_static_method(
                "android/net/Uri",
                "parse",
                "(Ljava/lang/String;)Landroid/net/Uri;",
                &[JValue::Object(&j_uri_str)],
            )
            .map_err(|e| store_err(&mut env, "Uri.parse", e))?
            .l()
            .map_err(|e| UssdPlusError::Store(format!("Uri.parse->l: {e}")))?;

        // ContentResolver resolver = activity.getContentResolver()
        let resolver: JObject = env
            .call_method(
                activity,
                "getContentResolver",
                "()Landroid/content/ContentResolver;",
                &[],
            )
            .map_err(|e| store_err(&mut env, "getContentResolver", e))?
            .l()
            .map_err(|e| UssdPlusError::Store(format!("getContentResolver->l: {e}")))?;

        let projection: JObject = match &query.projection {
            Some(columns) => string_array(&mut env, columns)
                .map_err(|e| store_err(&mut env, "projection", e))?
                .into(),
            None => JObject::null(),
        };

        let j_sort: JString = env
            .new_string(query.sort_order())
            .map_err(|e| store_err(&mut env, "new_string(sortOrder)", e))?;

        // resolver.query(uri, projection, null, null, "date DESC LIMIT n")
        let cursor: JObject = env
            .call_method(
                &resolver,
                "query",
                QUERY_SIG,
                &[
                    JValue::Object(&uri),
                    JValue::Object(&projection),
                    JValue::Object(&JObject::null()),
                    JValue::Object(&JObject::null()),
                    JValue::Object(&j_sort),
                ],
            )
            .map_err(|e| store_err(&mut env, "ContentResolver.query", e))?
            .l()
            .map_err(|e| UssdPlusError::Store(format!("query->l: {e}")))?;

        if cursor.is_null() {
            tracing::warn!(uri = %query.uri, "Android: provider returned a null cursor");
            return Ok(());
        }

        // From here on `Drop` owns the close.
        let mut cursor = AndroidCursor {
            env: &mut env,
            cursor,
            columns: Vec::new(),
        };
        cursor.columns = cursor.read_column_names()?;
        visit(&mut cursor)
    }
}

// ---------------------------------------------------------------------------
// Cursor wrapper
// ---------------------------------------------------------------------------

/// Live `android.database.Cursor`, closed exactly once on drop.
struct AndroidCursor<'a, 'local> {
    env: &'a mut JNIEnv<'local>,
    cursor: JObject<'local>,
    columns: Vec<String>,
}

impl<'local> AndroidCursor<'_, 'local> {
    fn call(&mut self, method: &str, sig: &str, args: &[JValue<'_, '_>]) -> Result<JValueOwned<'local>> {
        match self.env.call_method(&self.cursor, method, sig, args) {
            Ok(value) => Ok(value),
            Err(e) => Err(store_err(self.env, method, e)),
        }
    }

    fn read_column_names(&mut self) -> Result<Vec<String>> {
        let array: JObjectArray = self
            .call("getColumnNames", "()[Ljava/lang/String;", &[])?
            .l()
            .map_err(|e| UssdPlusError::Store(format!("getColumnNames->l: {e}")))?
            .into();

        let len = self
            .env
            .get_array_length(&array)
            .map_err(|e| store_err(self.env, "getColumnNames.length", e))?;

        let mut names = Vec::with_capacity(len as usize);
        for idx in 0..len {
            let element = self
                .env
                .get_object_array_element(&array, idx)
                .map_err(|e| store_err(self.env, "getColumnNames[i]", e))?;
            let name = java_string(self.env, element)
                .map_err(|e| store_err(self.env, "column name", e))?;
            names.push(name);
        }
        Ok(names)
    }

    fn read_cell(&mut self, idx: usize) -> Result<CellValue> {
        let column = idx as i32;
        let field_type = self
            .call("getType", "(I)I", &[JValue::Int(column)])?
            .i()
            .map_err(|e| UssdPlusError::Store(format!("getType->i: {e}")))?;

        let cell = match field_type {
            FIELD_TYPE_NULL => CellValue::Null,
            FIELD_TYPE_INTEGER => CellValue::Integer(
                self.call("getLong", "(I)J", &[JValue::Int(column)])?
                    .j()
                    .map_err(|e| UssdPlusError::Store(format!("getLong->j: {e}")))?,
            ),
            FIELD_TYPE_FLOAT => CellValue::Real(
                self.call("getDouble", "(I)D", &[JValue::Int(column)])?
                    .d()
                    .map_err(|e| UssdPlusError::Store(format!("getDouble->d: {e}")))?,
            ),
            FIELD_TYPE_STRING => {
                let obj = self
                    .call("getString", "(I)Ljava/lang/String;", &[JValue::Int(column)])?
                    .l()
                    .map_err(|e| UssdPlusError::Store(format!("getString->l: {e}")))?;
                if obj.is_null() {
                    CellValue::Null
                } else {
                    CellValue::Text(
                        java_string(self.env, obj).map_err(|e| store_err(self.env, "getString", e))?,
                    )
                }
            }
            FIELD_TYPE_BLOB => {
                let bytes: JByteArray = self
                    .call("getBlob", "(I)[B", &[JValue::Int(column)])?
                    .l()
                    .map_err(|e| UssdPlusError::Store(format!("getBlob->l: {e}")))?
                    .into();
                let data = self
                    .env
                    .convert_byte_array(&bytes)
                    .map_err(|e| store_err(self.env, "getBlob", e))?;
                self.env
                    .delete_local_ref(bytes)
                    .map_err(|e| store_err(self.env, "delete_local_ref(blob)", e))?;
                CellValue::Blob(data)
            }
            other => {
                return Err(UssdPlusError::Coercion {
                    column: self.columns[idx].clone(),
                    detail: format!("unknown cursor field type {other}"),
                });
            }
        };
        Ok(cell)
    }
}

impl InboxCursor for AndroidCursor<'_, '_> {
    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<CellValue>>> {
        let has_row = self
            .call("moveToNext", "()Z", &[])?
            .z()
            .map_err(|e| UssdPlusError::Store(format!("moveToNext->z: {e}")))?;
        if !has_row {
            return Ok(None);
        }

        let mut cells = Vec::with_capacity(self.columns.len());
        for idx in 0..self.columns.len() {
            cells.push(self.read_cell(idx)?);
        }
        Ok(Some(cells))
    }
}

impl Drop for AndroidCursor<'_, '_> {
    fn drop(&mut self) {
        // Any exception left over from a failed read has already been
        // cleared by `describe`; JNI calls are illegal while one is pending.
        if let Err(e) = self.env.call_method(&self.cursor, "close", "()V", &[]) {
            let detail = describe(self.env, "Cursor.close", e);
            tracing::warn!(error = %detail, "Android: failed to close SMS cursor");
        } else {
            tracing::debug!("Android: SMS cursor closed");
        }
    }
}
