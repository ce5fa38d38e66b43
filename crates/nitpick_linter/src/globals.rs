//! Predefined ECMAScript global names.
//!
//! These seed the module scope as identifier-less `const` declarations, so
//! assigning to one reports an assignment to a const global.

pub(crate) const GLOBAL_VARIABLES: &[&str] = &[
    "globalThis",
    // Value properties
    "Infinity",
    "NaN",
    "undefined",
    // Function properties
    "decodeURI",
    "decodeURIComponent",
    "encodeURI",
    "encodeURIComponent",
    "eval",
    "isFinite",
    "isNaN",
    "parseFloat",
    "parseInt",
    // Fundamental objects
    "Boolean",
    "Error",
    "EvalError",
    "Function",
    "Object",
    "RangeError",
    "ReferenceError",
    "Symbol",
    "SyntaxError",
    "TypeError",
    "URIError",
    // Numbers and dates
    "BigInt",
    "Date",
    "Math",
    "Number",
    // Text processing
    "RegExp",
    "String",
    // Indexed collections
    "Array",
    "BigInt64Array",
    "BigUint64Array",
    "Float32Array",
    "Float64Array",
    "Int16Array",
    "Int32Array",
    "Int8Array",
    "Uint16Array",
    "Uint32Array",
    "Uint8Array",
    "Uint8ClampedArray",
    // Keyed collections
    "Map",
    "Set",
    "WeakMap",
    "WeakSet",
    // Structured data
    "ArrayBuffer",
    "Atomics",
    "DataView",
    "JSON",
    "SharedArrayBuffer",
    // Control abstraction
    "Promise",
    "Proxy",
    "Reflect",
    // Host
    "console",
];
