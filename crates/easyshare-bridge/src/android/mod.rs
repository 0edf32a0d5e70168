// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android platform bridge via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. The host activity loads this library, calls
// `nativeInit(applicationContext)` once, and forwards every
// `easyshare/downloads` method call to `nativeHandleCall(method, argsJson)`,
// returning the JSON envelope it gets back to the Dart side.
//
// ## Architecture notes
//
// API 29+ goes through `ContentResolver` and `MediaStore.Downloads`: insert a
// row with `IS_PENDING = 1`, stream the bytes into `openOutputStream(uri)`,
// then `update` the row to `IS_PENDING = 0`. Older releases write into
// `Environment.getExternalStoragePublicDirectory(DIRECTORY_DOWNLOADS)` with
// plain file I/O on the Rust side.

#![cfg(target_os = "android")]

use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use jni::objects::{GlobalRef, JObject, JString, JValue};
use jni::sys::jstring;
use jni::{JNIEnv, JavaVM};

use easyshare_core::BridgeConfig;
use easyshare_core::error::{CODE_SAVE, EasyshareError, Result};
use easyshare_storage::{ManagedIndexBackend, MediaIndex, StorageBackend};

use crate::channel::{DownloadsChannel, MethodResponse};
use crate::traits::*;

/// `Environment.DIRECTORY_DOWNLOADS`.
const DIRECTORY_DOWNLOADS: &str = "Download";

/// `MediaStore.Downloads` column names.
const COLUMN_DISPLAY_NAME: &str = "_display_name";
const COLUMN_MIME_TYPE: &str = "mime_type";
const COLUMN_IS_PENDING: &str = "is_pending";

static VM: OnceLock<JavaVM> = OnceLock::new();
static APP_CONTEXT: OnceLock<GlobalRef> = OnceLock::new();
static CHANNEL: OnceLock<Mutex<DownloadsChannel>> = OnceLock::new();

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

/// The process `JavaVM`, from `nativeInit` or else the NDK glue context.
fn java_vm() -> Result<&'static JavaVM> {
    if let Some(vm) = VM.get() {
        return Ok(vm);
    }
    let ctx = ndk_context::android_context();
    if ctx.vm().is_null() {
        return Err(EasyshareError::Bridge(
            "JavaVM not available — call nativeInit first".into(),
        ));
    }
    // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
    // The pointer is guaranteed valid for the lifetime of the process.
    let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }
        .map_err(|e| EasyshareError::Bridge(format!("failed to obtain JavaVM: {e}")))?;
    Ok(VM.get_or_init(|| vm))
}

/// Obtain a [`JNIEnv`] for the current thread, attaching it if needed.
fn jni_env() -> Result<JNIEnv<'static>> {
    java_vm()?
        .attach_current_thread_permanently()
        .map_err(|e| EasyshareError::Bridge(format!("failed to attach JNI thread: {e}")))
}

/// The application `Context`, from `nativeInit` or else the NDK glue.
fn app_context(env: &mut JNIEnv<'_>) -> Result<&'static JObject<'static>> {
    if let Some(ctx) = APP_CONTEXT.get() {
        return Ok(ctx.as_obj());
    }
    let ptr = ndk_context::android_context().context();
    if ptr.is_null() {
        return Err(EasyshareError::Bridge(
            "Android context is null — call nativeInit first".into(),
        ));
    }
    // SAFETY: the NDK guarantees this pointer is a valid global jobject for
    // the hosting Activity.
    let obj = unsafe { JObject::from_raw(ptr.cast()) };
    let global = env
        .new_global_ref(&obj)
        .map_err(|e| EasyshareError::Bridge(format!("new_global_ref(context): {e}")))?;
    Ok(APP_CONTEXT.get_or_init(|| global).as_obj())
}

/// Clear a pending Java exception and return its `toString()`.
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
    env.get_string(&JString::from(text)).ok().map(Into::into)
}

/// Run one JNI step, turning a failure (and any pending Java exception)
/// into `EasyshareError::Bridge`.
fn jcall<'local, T>(
    env: &mut JNIEnv<'local>,
    context: &str,
    f: impl FnOnce(&mut JNIEnv<'local>) -> jni::errors::Result<T>,
) -> Result<T> {
    f(&mut *env).map_err(|e| match take_exception(env) {
        Some(exception) => EasyshareError::Bridge(format!("{context}: {exception}")),
        None => EasyshareError::Bridge(format!("{context}: {e}")),
    })
}

fn content_resolver<'local>(
    env: &mut JNIEnv<'local>,
    context: &JObject<'_>,
) -> Result<JObject<'local>> {
    jcall(env, "getContentResolver", |env| {
        env.call_method(
            context,
            "getContentResolver",
            "()Landroid/content/ContentResolver;",
            &[],
        )?
        .l()
    })
}

fn put_string(env: &mut JNIEnv<'_>, values: &JObject<'_>, key: &str, value: &str) -> Result<()> {
    jcall(env, "ContentValues.put(String)", |env| {
        let j_key = env.new_string(key)?;
        let j_value = env.new_string(value)?;
        env.call_method(
            values,
            "put",
            "(Ljava/lang/String;Ljava/lang/String;)V",
            &[JValue::Object(&j_key), JValue::Object(&j_value)],
        )?;
        Ok(())
    })
}

fn put_int(env: &mut JNIEnv<'_>, values: &JObject<'_>, key: &str, value: i32) -> Result<()> {
    jcall(env, "ContentValues.put(Integer)", |env| {
        let j_key = env.new_string(key)?;
        let boxed = env
            .call_static_method(
                "java/lang/Integer",
                "valueOf",
                "(I)Ljava/lang/Integer;",
                &[JValue::Int(value)],
            )?
            .l()?;
        env.call_method(
            values,
            "put",
            "(Ljava/lang/String;Ljava/lang/Integer;)V",
            &[JValue::Object(&j_key), JValue::Object(&boxed)],
        )?;
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// Android implementation of the EasyShare platform bridge.
///
/// The struct is zero-sized; all state lives on the Java side.
pub struct AndroidPlatform;

impl AndroidPlatform {
    /// Create a new Android bridge.
    ///
    /// This does **not** touch JNI — the first JNI call happens lazily when
    /// a trait method is invoked.
    pub fn new() -> Self {
        Self
    }
}

impl Default for AndroidPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl NativePlatform for AndroidPlatform {
    fn platform_name(&self) -> &str {
        "Android"
    }
}

// ---------------------------------------------------------------------------
// NativeVersion — android.os.Build.VERSION
// ---------------------------------------------------------------------------

impl NativeVersion for AndroidPlatform {
    fn sdk_int(&self) -> Result<i32> {
        let mut env = jni_env()?;
        jcall(&mut env, "Build.VERSION.SDK_INT", |env| {
            env.get_static_field("android/os/Build$VERSION", "SDK_INT", "I")?
                .i()
        })
    }
}

// ---------------------------------------------------------------------------
// NativeDownloads — MediaStore.Downloads / Environment
// ---------------------------------------------------------------------------

impl NativeDownloads for AndroidPlatform {
    fn managed_index_backend(&self, config: &BridgeConfig) -> Result<Box<dyn StorageBackend>> {
        Ok(Box::new(ManagedIndexBackend::new(
            ContentResolverIndex,
            config.mime_type.clone(),
            config.copy_buffer_size,
        )))
    }

    /// `Environment.getExternalStoragePublicDirectory(DIRECTORY_DOWNLOADS)`.
    ///
    /// Writing there needs `WRITE_EXTERNAL_STORAGE` on API < 29; the host
    /// app requests it.
    fn public_downloads_dir(&self) -> Result<PathBuf> {
        let mut env = jni_env()?;
        let path: String = jcall(&mut env, "getExternalStoragePublicDirectory", |env| {
            let j_type = env.new_string(DIRECTORY_DOWNLOADS)?;
            let dir = env
                .call_static_method(
                    "android/os/Environment",
                    "getExternalStoragePublicDirectory",
                    "(Ljava/lang/String;)Ljava/io/File;",
                    &[JValue::Object(&j_type)],
                )?
                .l()?;
            let j_path = env
                .call_method(&dir, "getAbsolutePath", "()Ljava/lang/String;", &[])?
                .l()?;
            Ok(env.get_string(&JString::from(j_path))?.into())
        })?;
        tracing::debug!(path = %path, "Android: public Downloads directory");
        Ok(PathBuf::from(path))
    }
}

// ---------------------------------------------------------------------------
// ContentResolverIndex — MediaIndex over MediaStore.Downloads
// ---------------------------------------------------------------------------

/// A row inserted into `MediaStore.Downloads`.
pub struct DownloadEntry {
    uri: GlobalRef,
    location: String,
}

/// [`MediaIndex`] backed by `ContentResolver` and
/// `MediaStore.Downloads.EXTERNAL_CONTENT_URI`.
pub struct ContentResolverIndex;

impl MediaIndex for ContentResolverIndex {
    type Entry = DownloadEntry;

    fn insert_pending(&self, display_name: &str, mime_type: &str) -> Result<DownloadEntry> {
        let mut env = jni_env()?;
        let context = app_context(&mut env)?;

        let values = jcall(&mut env, "new ContentValues", |env| {
            env.new_object("android/content/ContentValues", "()V", &[])
        })?;
        put_string(&mut env, &values, COLUMN_DISPLAY_NAME, display_name)?;
        put_string(&mut env, &values, COLUMN_MIME_TYPE, mime_type)?;
        put_int(&mut env, &values, COLUMN_IS_PENDING, 1)?;

        let collection = jcall(&mut env, "MediaStore.Downloads.EXTERNAL_CONTENT_URI", |env| {
            env.get_static_field(
                "android/provider/MediaStore$Downloads",
                "EXTERNAL_CONTENT_URI",
                "Landroid/net/Uri;",
            )?
            .l()
        })?;
        let resolver = content_resolver(&mut env, context)?;

        let uri = jcall(&mut env, "ContentResolver.insert", |env| {
            env.call_method(
                &resolver,
                "insert",
                "(Landroid/net/Uri;Landroid/content/ContentValues;)Landroid/net/Uri;",
                &[JValue::Object(&collection), JValue::Object(&values)],
            )?
            .l()
        })?;
        if uri.is_null() {
            return Err(EasyshareError::SaveFailed(
                "ContentResolver.insert returned null".into(),
            ));
        }

        let location: String = jcall(&mut env, "Uri.toString", |env| {
            let text = env
                .call_method(&uri, "toString", "()Ljava/lang/String;", &[])?
                .l()?;
            Ok(env.get_string(&JString::from(text))?.into())
        })?;
        let uri = jcall(&mut env, "new_global_ref(uri)", |env| env.new_global_ref(&uri))?;

        tracing::info!(uri = %location, "Android: pending Downloads row inserted");
        Ok(DownloadEntry { uri, location })
    }

    fn open_sink<'a>(
        &'a self,
        entry: &DownloadEntry,
        _len: u64,
    ) -> Result<Option<Box<dyn io::Write + 'a>>> {
        let mut env = jni_env()?;
        let context = app_context(&mut env)?;
        let resolver = content_resolver(&mut env, context)?;

        let stream = jcall(&mut env, "ContentResolver.openOutputStream", |env| {
            env.call_method(
                &resolver,
                "openOutputStream",
                "(Landroid/net/Uri;)Ljava/io/OutputStream;",
                &[JValue::Object(entry.uri.as_obj())],
            )?
            .l()
        })?;
        if stream.is_null() {
            return Ok(None);
        }
        let stream = jcall(&mut env, "new_global_ref(stream)", |env| {
            env.new_global_ref(&stream)
        })?;

        Ok(Some(Box::new(JavaOutputStream {
            env,
            stream,
            closed: false,
        })))
    }

    fn publish(&self, entry: &DownloadEntry) -> Result<()> {
        let mut env = jni_env()?;
        let context = app_context(&mut env)?;

        let values = jcall(&mut env, "new ContentValues", |env| {
            env.new_object("android/content/ContentValues", "()V", &[])
        })?;
        put_int(&mut env, &values, COLUMN_IS_PENDING, 0)?;
        let resolver = content_resolver(&mut env, context)?;

        let updated = jcall(&mut env, "ContentResolver.update", |env| {
            env.call_method(
                &resolver,
                "update",
                "(Landroid/net/Uri;Landroid/content/ContentValues;Ljava/lang/String;[Ljava/lang/String;)I",
                &[
                    JValue::Object(entry.uri.as_obj()),
                    JValue::Object(&values),
                    JValue::Object(&JObject::null()),
                    JValue::Object(&JObject::null()),
                ],
            )?
            .i()
        })?;
        if updated == 0 {
            return Err(EasyshareError::SaveFailed(format!(
                "no row updated when publishing {}",
                entry.location
            )));
        }
        Ok(())
    }

    fn remove(&self, entry: &DownloadEntry) -> Result<()> {
        let mut env = jni_env()?;
        let context = app_context(&mut env)?;
        let resolver = content_resolver(&mut env, context)?;

        jcall(&mut env, "ContentResolver.delete", |env| {
            env.call_method(
                &resolver,
                "delete",
                "(Landroid/net/Uri;Ljava/lang/String;[Ljava/lang/String;)I",
                &[
                    JValue::Object(entry.uri.as_obj()),
                    JValue::Object(&JObject::null()),
                    JValue::Object(&JObject::null()),
                ],
            )?
            .i()
        })?;
        tracing::info!(uri = %entry.location, "Android: removed failed Downloads row");
        Ok(())
    }

    fn location(&self, entry: &DownloadEntry) -> String {
        entry.location.clone()
    }
}

// ---------------------------------------------------------------------------
// JavaOutputStream — io::Write over java.io.OutputStream
// ---------------------------------------------------------------------------

/// Owns a `java.io.OutputStream` and closes it when dropped.
struct JavaOutputStream {
    env: JNIEnv<'static>,
    stream: GlobalRef,
    closed: bool,
}

impl JavaOutputStream {
    fn io_err(&mut self, context: &str, e: jni::errors::Error) -> io::Error {
        let detail = take_exception(&mut self.env).unwrap_or_else(|| e.to_string());
        io::Error::other(format!("{context}: {detail}"))
    }
}

impl io::Write for JavaOutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let chunk = &buf[..buf.len().min(i32::MAX as usize)];
        let array = match self.env.byte_array_from_slice(chunk) {
            Ok(array) => array,
            Err(e) => return Err(self.io_err("byte_array_from_slice", e)),
        };
        let written = self.env.call_method(
            self.stream.as_obj(),
            "write",
            "([BII)V",
            &[
                JValue::Object(&array),
                JValue::Int(0),
                JValue::Int(chunk.len() as i32),
            ],
        );
        let _ = self.env.delete_local_ref(array);
        match written {
            Ok(_) => Ok(chunk.len()),
            Err(e) => Err(self.io_err("OutputStream.write", e)),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self
            .env
            .call_method(self.stream.as_obj(), "flush", "()V", &[])
        {
            Ok(_) => Ok(()),
            Err(e) => Err(self.io_err("OutputStream.flush", e)),
        }
    }
}

impl Drop for JavaOutputStream {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self
            .env
            .call_method(self.stream.as_obj(), "close", "()V", &[])
        {
            let detail = take_exception(&mut self.env).unwrap_or_else(|| e.to_string());
            tracing::warn!(error = %detail, "Android: OutputStream.close failed");
        }
    }
}

// ---------------------------------------------------------------------------
// JNI entry points — called from the host activity
// ---------------------------------------------------------------------------

/// Build (once) the process-wide channel.
fn channel() -> Result<&'static Mutex<DownloadsChannel>> {
    if let Some(channel) = CHANNEL.get() {
        return Ok(channel);
    }
    let built = DownloadsChannel::for_platform(&AndroidPlatform::new(), &BridgeConfig::default())?;
    Ok(CHANNEL.get_or_init(|| Mutex::new(built)))
}

fn dispatch(env: &mut JNIEnv<'_>, method: &JString<'_>, args_json: &JString<'_>) -> String {
    let method: String = match env.get_string(method) {
        Ok(s) => s.into(),
        Err(e) => {
            let _ = take_exception(env);
            return MethodResponse::error(CODE_SAVE, format!("unreadable method name: {e}"))
                .to_json();
        }
    };
    let args: Option<String> = if args_json.is_null() {
        None
    } else {
        match env.get_string(args_json) {
            Ok(s) => Some(s.into()),
            Err(e) => {
                let _ = take_exception(env);
                return MethodResponse::error(CODE_SAVE, format!("unreadable arguments: {e}"))
                    .to_json();
            }
        }
    };

    match channel() {
        Ok(channel) => channel
            .lock()
            // Recover from poisoned mutex (another call panicked while holding lock)
            .unwrap_or_else(|e| e.into_inner())
            .handle_json(&method, args.as_deref()),
        Err(e) => MethodResponse::from_error(&e).to_json(),
    }
}

/// `external fun nativeInit(context: Context)` on the host activity.
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_example_easyshare_MainActivity_nativeInit<'local>(
    env: JNIEnv<'local>,
    _this: JObject<'local>,
    context: JObject<'local>,
) {
    match env.get_java_vm() {
        Ok(vm) => {
            let _ = VM.set(vm);
        }
        Err(e) => tracing::warn!(error = %e, "Android: get_java_vm failed"),
    }
    match env.new_global_ref(&context) {
        Ok(global) => {
            let _ = APP_CONTEXT.set(global);
        }
        Err(e) => tracing::warn!(error = %e, "Android: new_global_ref(context) failed"),
    }
}

/// `external fun nativeHandleCall(method: String, argsJson: String?): String`
/// on the host activity. Always returns a JSON response envelope.
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_example_easyshare_MainActivity_nativeHandleCall<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    method: JString<'local>,
    args_json: JString<'local>,
) -> jstring {
    let json = catch_unwind(AssertUnwindSafe(|| dispatch(&mut env, &method, &args_json)))
        .unwrap_or_else(|_| {
            tracing::warn!("Android: panic while handling method call");
            MethodResponse::error(CODE_SAVE, "internal error while handling call").to_json()
        });
    match env.new_string(json) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            tracing::warn!(error = %e, "Android: could not allocate response string");
            std::ptr::null_mut()
        }
    }
}
